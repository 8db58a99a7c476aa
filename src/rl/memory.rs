//! Experience storage for the three trainers
//!
//! Each algorithm consumes experience differently:
//! - DQN keeps a bounded replay buffer it samples minibatches from
//! - PPO keeps an on-policy rollout (with behavior-policy log probs) that is
//!   drained whole at update time
//! - A3C keeps a plain episode trace drained at episode end
//!
//! All three implement the same [`ExperienceStore`] contract so the trainers
//! share one record/drain shape. The stores hold plain `f32` data; tensors
//! are built lazily at update time so the stores stay backend-agnostic.

use super::observation::Observation;
use rand::Rng;
use std::collections::VecDeque;

/// Common contract for the per-algorithm experience stores
pub trait ExperienceStore {
    type Item;

    /// Append one item
    fn record(&mut self, item: Self::Item);

    /// Take every stored item, leaving the store empty
    fn drain(&mut self) -> Vec<Self::Item>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One off-policy transition for DQN
#[derive(Debug, Clone, Copy)]
pub struct Transition {
    pub state: Observation,
    /// Action index in [straight, right, left] order
    pub action: usize,
    pub reward: f32,
    pub next_state: Observation,
    pub done: bool,
}

/// Bounded FIFO replay buffer
///
/// When full, recording evicts the oldest transition.
pub struct ReplayBuffer {
    buffer: VecDeque<Transition>,
    capacity: usize,
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
        }
    }

    /// Sample a batch uniformly without replacement
    ///
    /// If the buffer holds fewer than `batch_size` transitions, every stored
    /// transition is returned instead.
    pub fn sample<R: Rng>(&self, batch_size: usize, rng: &mut R) -> Vec<Transition> {
        if self.buffer.len() <= batch_size {
            return self.buffer.iter().copied().collect();
        }
        rand::seq::index::sample(rng, self.buffer.len(), batch_size)
            .into_iter()
            .map(|i| self.buffer[i])
            .collect()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl ExperienceStore for ReplayBuffer {
    type Item = Transition;

    fn record(&mut self, item: Transition) {
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(item);
    }

    fn drain(&mut self) -> Vec<Transition> {
        self.buffer.drain(..).collect()
    }

    fn len(&self) -> usize {
        self.buffer.len()
    }
}

/// One on-policy step for PPO, tagged with the behavior policy's log prob
#[derive(Debug, Clone, Copy)]
pub struct PolicyStep {
    pub state: Observation,
    pub action: usize,
    /// Log probability of `action` under the policy that produced it
    pub log_prob: f32,
    pub reward: f32,
    pub done: bool,
}

/// Rollout memory for PPO, drained whole at each update
#[derive(Default)]
pub struct RolloutMemory {
    steps: Vec<PolicyStep>,
}

impl RolloutMemory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExperienceStore for RolloutMemory {
    type Item = PolicyStep;

    fn record(&mut self, item: PolicyStep) {
        self.steps.push(item);
    }

    fn drain(&mut self) -> Vec<PolicyStep> {
        std::mem::take(&mut self.steps)
    }

    fn len(&self) -> usize {
        self.steps.len()
    }
}

/// One step of an A3C episode trace
#[derive(Debug, Clone, Copy)]
pub struct EpisodeStep {
    pub state: Observation,
    pub action: usize,
    pub reward: f32,
}

/// Episode memory for A3C, drained whole at episode end
#[derive(Default)]
pub struct EpisodeMemory {
    steps: Vec<EpisodeStep>,
}

impl EpisodeMemory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExperienceStore for EpisodeMemory {
    type Item = EpisodeStep;

    fn record(&mut self, item: EpisodeStep) {
        self.steps.push(item);
    }

    fn drain(&mut self) -> Vec<EpisodeStep> {
        std::mem::take(&mut self.steps)
    }

    fn len(&self) -> usize {
        self.steps.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn transition(reward: f32) -> Transition {
        let obs = Observation([0.0; 11]);
        Transition {
            state: obs,
            action: 0,
            reward,
            next_state: obs,
            done: false,
        }
    }

    #[test]
    fn test_replay_buffer_evicts_oldest() {
        let mut buffer = ReplayBuffer::new(3);
        for i in 0..5 {
            buffer.record(transition(i as f32));
        }

        assert_eq!(buffer.len(), 3);
        let rewards: Vec<f32> = buffer.drain().iter().map(|t| t.reward).collect();
        assert_eq!(rewards, vec![2.0, 3.0, 4.0]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_sample_returns_all_when_underfull() {
        let mut buffer = ReplayBuffer::new(100);
        for i in 0..5 {
            buffer.record(transition(i as f32));
        }

        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(buffer.sample(10, &mut rng).len(), 5);
    }

    #[test]
    fn test_sample_is_without_replacement() {
        let mut buffer = ReplayBuffer::new(100);
        for i in 0..50 {
            buffer.record(transition(i as f32));
        }

        let mut rng = StdRng::seed_from_u64(7);
        let batch = buffer.sample(20, &mut rng);
        assert_eq!(batch.len(), 20);

        let mut rewards: Vec<i64> = batch.iter().map(|t| t.reward as i64).collect();
        rewards.sort_unstable();
        rewards.dedup();
        assert_eq!(rewards.len(), 20);
    }

    #[test]
    fn test_repeated_sampling_varies() {
        let mut buffer = ReplayBuffer::new(100);
        for i in 0..50 {
            buffer.record(transition(i as f32));
        }

        let mut rng = StdRng::seed_from_u64(7);
        let a: Vec<i64> = buffer.sample(10, &mut rng).iter().map(|t| t.reward as i64).collect();
        let b: Vec<i64> = buffer.sample(10, &mut rng).iter().map(|t| t.reward as i64).collect();
        assert_ne!(a, b);
    }

    #[test]
    fn test_rollout_memory_drains_in_order() {
        let mut memory = RolloutMemory::new();
        for i in 0..4 {
            memory.record(PolicyStep {
                state: Observation([0.0; 11]),
                action: i,
                log_prob: -1.0,
                reward: i as f32,
                done: i == 3,
            });
        }

        let steps = memory.drain();
        assert!(memory.is_empty());
        assert_eq!(steps.len(), 4);
        assert_eq!(steps[3].action, 3);
        assert!(steps[3].done);
    }

    #[test]
    fn test_episode_memory_drains() {
        let mut memory = EpisodeMemory::new();
        memory.record(EpisodeStep {
            state: Observation([0.0; 11]),
            action: 1,
            reward: 10.0,
        });

        assert_eq!(memory.len(), 1);
        let steps = memory.drain();
        assert_eq!(steps[0].reward, 10.0);
        assert!(memory.is_empty());
    }
}
