use serde::{
    Serialize,
    Deserialize,
};


#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    // The total number of training episodes.
    max_episodes: usize,
    // The number of greedy (noise free) episodes run after training.
    test_episodes: usize,
    // Save a checkpoint every this many episodes, if set.
    checkpoint_frequency: Option<usize>,
}
impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            max_episodes: 500,
            test_episodes: 10,
            checkpoint_frequency: Some(100),
        }
    }
}
impl TrainConfig {
    pub fn new(
        max_episodes: usize,
        test_episodes: usize,
        checkpoint_frequency: Option<usize>,
    ) -> Self {
        Self {
            max_episodes,
            test_episodes,
            checkpoint_frequency,
        }
    }

    pub fn reach() -> Self {
        Self {
            max_episodes: 300,
            test_episodes: 20,
            checkpoint_frequency: Some(50),
        }
    }

    pub fn max_episodes(&self) -> usize {
        self.max_episodes
    }
    pub fn test_episodes(&self) -> usize {
        self.test_episodes
    }
    pub fn checkpoint_frequency(&self) -> Option<usize> {
        self.checkpoint_frequency
    }
    pub fn set_max_episodes(&mut self, max_episodes: usize) {
        self.max_episodes = max_episodes;
    }
    pub fn set_test_episodes(&mut self, test_episodes: usize) {
        self.test_episodes = test_episodes;
    }
    pub fn set_checkpoint_frequency(&mut self, checkpoint_frequency: Option<usize>) {
        self.checkpoint_frequency = checkpoint_frequency;
    }

    /// Whether a checkpoint is due after the (zero based) `episode`.
    pub fn checkpoint_due(&self, episode: usize) -> bool {
        match self.checkpoint_frequency {
            Some(freq) if freq > 0 => (episode + 1) % freq == 0,
            _ => false,
        }
    }
}
