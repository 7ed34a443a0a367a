//! Router implementations.
//!
//! Both routers are total: a `shard_count` of zero yields shard 0, which the
//! Registry then rejects as out of range instead of dividing by zero.

use crate::ports::Router;

/// `index % shard_count`. The default policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModulusRouter;

impl ModulusRouter {
    pub fn new() -> Self {
        Self
    }
}

impl Router for ModulusRouter {
    fn route(&self, shard_count: usize, index: usize) -> usize {
        index.checked_rem(shard_count).unwrap_or(0)
    }
}

/// Routes runs of `block_size` consecutive indices to the same shard,
/// cycling through shards block by block.
///
/// With `block_size = 1` this is the same as [`ModulusRouter`].
#[derive(Debug, Clone, Copy)]
pub struct BlockRouter {
    block_size: usize,
}

impl BlockRouter {
    /// A `block_size` of zero is treated as one.
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size: block_size.max(1),
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }
}

impl Router for BlockRouter {
    fn route(&self, shard_count: usize, index: usize) -> usize {
        (index / self.block_size)
            .checked_rem(shard_count)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    #[rstest]
    #[case(0, 0)]
    #[case(3, 3)]
    #[case(10, 0)]
    #[case(47, 7)]
    #[case(99, 9)]
    fn modulus_routes_by_remainder(#[case] index: usize, #[case] shard: usize) {
        assert_eq!(ModulusRouter.route(10, index), shard);
    }

    #[test]
    fn modulus_is_stable_and_in_range() {
        let router = ModulusRouter::new();
        for index in 0..100 {
            let first = router.route(10, index);
            assert!(first < 10);
            for _ in 0..3 {
                assert_eq!(router.route(10, index), first);
            }
        }
    }

    #[rstest]
    #[case::modulus(Box::new(ModulusRouter) as Box<dyn Router>)]
    #[case::block(Box::new(BlockRouter::new(4)) as Box<dyn Router>)]
    fn every_shard_is_reachable(#[case] router: Box<dyn Router>) {
        let reached: HashSet<usize> = (0..100).map(|i| router.route(10, i)).collect();
        assert_eq!(reached, (0..10).collect());
    }

    #[test]
    fn block_router_keeps_blocks_together() {
        let router = BlockRouter::new(5);
        assert_eq!(router.route(4, 0), 0);
        assert_eq!(router.route(4, 4), 0);
        assert_eq!(router.route(4, 5), 1);
        assert_eq!(router.route(4, 19), 3);
        assert_eq!(router.route(4, 20), 0);
    }

    #[test]
    fn zero_block_size_behaves_like_modulus() {
        let router = BlockRouter::new(0);
        assert_eq!(router.block_size(), 1);
        for index in 0..20 {
            assert_eq!(router.route(6, index), ModulusRouter.route(6, index));
        }
    }

    #[test]
    fn zero_shards_does_not_panic() {
        assert_eq!(ModulusRouter.route(0, 12), 0);
        assert_eq!(BlockRouter::new(3).route(0, 12), 0);
    }
}
