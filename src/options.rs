use std::sync::Arc;

use lazyskip_node::prelude::{DEFAULT_MAX_HEIGHT, DEFAULT_P, HeightSampler};

use crate::{SkipList, error::Result};

#[derive(Debug, Default)]
pub struct Options {
    pub(crate) sampler: HeightSampler,
}

impl Options {
    pub fn p(&self) -> f64 {
        self.sampler.p()
    }

    pub fn max_height(&self) -> usize {
        self.sampler.max_height()
    }
}

#[derive(Debug, Clone)]
pub struct SkipListOptions {
    p: f64,

    max_height: usize,
}

impl Default for SkipListOptions {
    fn default() -> Self {
        Self {
            p: DEFAULT_P,
            max_height: DEFAULT_MAX_HEIGHT,
        }
    }
}

impl SkipListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Probability that a node does not grow another level.
    pub fn p(&mut self, p: f64) -> &mut Self {
        self.p = p;
        self
    }

    /// Height of the sentinels and cap for every sampled height.
    pub fn max_height(&mut self, height: usize) -> &mut Self {
        self.max_height = height;
        self
    }

    pub fn build(&self) -> Result<Arc<Options>> {
        let sampler = HeightSampler::new(self.p, self.max_height)?;
        Ok(Arc::new(Options { sampler }))
    }

    pub fn open<T>(&self) -> Result<SkipList<T>> {
        Ok(SkipList::with_options(self.build()?))
    }
}
