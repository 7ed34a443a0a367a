//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **ModulusRouter / BlockRouter**: Router
//! - **NoopPresenter / TracingPresenter / RecordingPresenter / FanoutPresenter**: Presenter

pub mod presenter;
pub mod routing;

pub use self::presenter::{
    BoardCell, FanoutPresenter, NoopPresenter, RecordingPresenter, TracingPresenter,
};
pub use self::routing::{BlockRouter, ModulusRouter};
