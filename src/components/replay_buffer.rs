use {
    crate::error::DdpgError,
    anyhow::Result,
    candle_core::{
        Device,
        Tensor,
    },
    rand::{
        seq::index,
        thread_rng,
    },
    std::collections::VecDeque,
    unzip_n::unzip_n,
};

unzip_n!(5);

/// A transition in the replay buffer.
///
/// # Fields
///
/// * `state` - The state tensor `[size_state]`.
/// * `action` - The action tensor `[size_action]`.
/// * `reward` - The reward.
/// * `next_state` - The next state tensor `[size_state]`.
/// * `done` - Whether the episode terminated with this transition.
#[derive(Clone, Debug)]
pub struct Transition {
    pub state: Tensor,
    pub action: Tensor,
    pub reward: f64,
    pub next_state: Tensor,
    pub done: bool,
}

/// A training batch decomposed into parallel tensors.
///
/// `states` and `next_states` are `[n, size_state]`, `actions` is
/// `[n, size_action]`, `rewards` is `[n, 1]` and `dones` is a `[n, 1]` u8
/// mask.
pub struct Batch {
    pub states: Tensor,
    pub actions: Tensor,
    pub rewards: Tensor,
    pub next_states: Tensor,
    pub dones: Tensor,
}

/// A replay buffer for off-policy algorithms.
///
/// The replay buffer is implemented as a simple ring buffer / VecDeque: once
/// `capacity` transitions are stored, every push evicts the oldest one.
///
/// # Fields
///
/// * `buffer` - The buffer of transitions, oldest first.
/// * `capacity` - The capacity of the buffer.
#[derive(Clone)]
pub struct ReplayBuffer {
    buffer: VecDeque<Transition>,
    capacity: usize,
}
impl ReplayBuffer {
    /// Create a new replay buffer with the given capacity.
    ///
    /// Memory is reserved lazily, the default capacity of a million
    /// transitions would otherwise be allocated upfront.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity.min(1 << 16)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of stored transitions.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Check if the buffer is full.
    pub fn is_full(&self) -> bool {
        self.buffer.len() == self.capacity
    }

    /// Iterate over the stored transitions, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.buffer.iter()
    }

    /// Push a transition into the buffer.
    ///
    /// If the buffer is full, the oldest transition is removed to make room for
    /// the new transition.
    pub fn push(
        &mut self,
        state: &Tensor,
        action: &Tensor,
        reward: f64,
        next_state: &Tensor,
        done: bool,
    ) {
        if self.capacity == 0 {
            return;
        }
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(Transition {
            state: state.clone(),
            action: action.clone(),
            reward,
            next_state: next_state.clone(),
            done,
        });
    }

    /// Sample `batch_size` distinct transitions uniformly at random.
    ///
    /// Fails with [`DdpgError::InsufficientData`] when fewer than
    /// `batch_size` transitions are stored.
    pub fn get_batch(
        &self,
        batch_size: usize,
    ) -> Result<Vec<&Transition>> {
        if self.buffer.len() < batch_size {
            Err(DdpgError::InsufficientData {
                requested: batch_size,
                available: self.buffer.len(),
            })?
        }
        Ok(index::sample(&mut thread_rng(), self.buffer.len(), batch_size)
            .into_iter()
            .map(|i| &self.buffer[i])
            .collect())
    }

    /// Sample a random batch and stack it into tensors.
    ///
    /// The actions are reshaped to `[batch_size, size_action]`, so buffers
    /// holding scalar actions for a one-dimensional action space produce the
    /// same layout as any other.
    pub fn random_batch(
        &self,
        batch_size: usize,
        size_action: usize,
        device: &Device,
    ) -> Result<Batch> {
        let transitions = self.get_batch(batch_size)?;

        let transition_to_tuple =
            |t: &Transition| -> candle_core::Result<(Tensor, Tensor, f64, Tensor, u8)> {
                Ok((
                    t.state.unsqueeze(0)?,
                    t.action.flatten_all()?.unsqueeze(0)?,
                    t.reward,
                    t.next_state.unsqueeze(0)?,
                    t.done as u8,
                ))
            };

        let (states, actions, rewards, next_states, dones) = transitions
            .into_iter()
            .map(transition_to_tuple)
            .collect::<candle_core::Result<Vec<(Tensor, Tensor, f64, Tensor, u8)>>>()?
            .into_iter()
            .unzip_n_vec();

        Ok(Batch {
            states: Tensor::cat(&states, 0)?.to_device(device)?,
            actions: Tensor::cat(&actions, 0)?
                .reshape((batch_size, size_action))?
                .to_device(device)?,
            rewards: Tensor::from_vec(rewards, (batch_size, 1), device)?,
            next_states: Tensor::cat(&next_states, 0)?.to_device(device)?,
            dones: Tensor::from_vec(dones, (batch_size, 1), device)?,
        })
    }
}


#[cfg(test)]
mod tests {
    use {
        super::*,
        proptest::prelude::*,
        std::collections::HashSet,
    };

    fn scalar(x: f64) -> Tensor {
        Tensor::new(&[x], &Device::Cpu).unwrap()
    }

    fn filled(n: usize, capacity: usize) -> ReplayBuffer {
        let mut buffer = ReplayBuffer::new(capacity);
        for i in 0..n {
            let x = i as f64;
            buffer.push(&scalar(x), &scalar(x), x, &scalar(x + 1.0), false);
        }
        buffer
    }

    #[test]
    fn test_get_batch_returns_distinct_transitions() -> Result<()> {
        let buffer = filled(10, 100);
        for _ in 0..50 {
            let batch = buffer.get_batch(10)?;
            assert_eq!(batch.len(), 10);
            let rewards = batch
                .iter()
                .map(|t| t.reward as i64)
                .collect::<HashSet<i64>>();
            assert_eq!(rewards.len(), 10);
        }
        Ok(())
    }

    #[test]
    fn test_get_batch_insufficient_data() {
        let buffer = filled(3, 100);
        let err = buffer.get_batch(4).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DdpgError>(),
            Some(&DdpgError::InsufficientData {
                requested: 4,
                available: 3
            }),
        );
    }

    #[test]
    fn test_random_batch_shapes() -> Result<()> {
        let mut buffer = ReplayBuffer::new(16);
        for i in 0..8 {
            let x = i as f64;
            buffer.push(
                &Tensor::new(&[x, x, x], &Device::Cpu)?,
                &Tensor::new(&[x, -x], &Device::Cpu)?,
                x,
                &Tensor::new(&[x, x, x], &Device::Cpu)?,
                i % 2 == 0,
            );
        }

        let batch = buffer.random_batch(4, 2, &Device::Cpu)?;
        assert_eq!(batch.states.dims(), &[4, 3]);
        assert_eq!(batch.actions.dims(), &[4, 2]);
        assert_eq!(batch.rewards.dims(), &[4, 1]);
        assert_eq!(batch.next_states.dims(), &[4, 3]);
        assert_eq!(batch.dones.dims(), &[4, 1]);

        // The columns stay aligned: every row comes from the same transition.
        let states = batch.states.to_vec2::<f64>()?;
        let rewards = batch.rewards.flatten_all()?.to_vec1::<f64>()?;
        let dones = batch.dones.flatten_all()?.to_vec1::<u8>()?;
        for i in 0..4 {
            assert_eq!(states[i][0], rewards[i]);
            assert_eq!(dones[i] == 1, (rewards[i] as usize) % 2 == 0);
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn prop_fifo_eviction(capacity in 1usize..32, extra in 1usize..64) {
            let pushed = capacity + extra;
            let buffer = filled(pushed, capacity);

            prop_assert_eq!(buffer.len(), capacity);
            prop_assert!(buffer.is_full());
            let kept = buffer.iter().map(|t| t.reward as usize).collect::<Vec<_>>();
            let expected = (pushed - capacity..pushed).collect::<Vec<_>>();
            prop_assert_eq!(kept, expected);
        }
    }
}
