#![cfg_attr(coverage_nightly, coverage(off))]

use mockall::mock;

use crate::{ArrayPool, Result};

mock! {
    #[derive(Debug)]
    pub BytePool {
    }

    impl ArrayPool<u8> for BytePool {
        fn rent(&self, min_len: usize) -> Result<Box<[u8]>>;
        fn return_array(&self, array: Box<[u8]>);
    }
}
