//! ticketeer-core
//!
//! Sharded in-process ticket registry with exactly-once claims.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, ticket, state, errors, events）
//! - **ports**: 抽象化レイヤー（Clock, IdGenerator, Router, Presenter）
//! - **impls**: ports の実装（ModulusRouter, BlockRouter, 各種 Presenter）
//! - **registry**: Shard と Registry、attempted パルス
//! - **app**: クレーム処理（ClaimProcess, Driver, DriverGroup, PulseReaper, RegistryBuilder）
//! - **config**: 実行設定（JSON）
//! - **observability**: 集計ビュー

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod registry;
