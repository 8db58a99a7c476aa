//! Training statistics tracking
//!
//! Tracks episode-level metrics (rewards, lengths, scores) and training
//! losses using rolling windows for smoothed statistics, plus the best score
//! seen so far.

use std::collections::VecDeque;

/// Training statistics tracker with rolling averages
///
/// # Example
///
/// ```rust
/// use snake_rl::metrics::TrainingStats;
///
/// let mut stats = TrainingStats::new(100);
/// stats.record_episode(15.5, 150, 5);
/// stats.record_loss(0.02);
///
/// println!("Mean reward: {}", stats.mean_episode_reward());
/// println!("{}", stats.format_summary());
/// ```
#[derive(Debug, Clone)]
pub struct TrainingStats {
    /// Episode rewards (rolling window)
    episode_rewards: VecDeque<f32>,

    /// Episode lengths in steps (rolling window)
    episode_lengths: VecDeque<usize>,

    /// Episode scores (food eaten) (rolling window)
    episode_scores: VecDeque<u32>,

    /// Training losses (rolling window)
    losses: VecDeque<f32>,

    /// Total number of episodes completed
    total_episodes: usize,

    /// Total number of environment steps taken
    total_steps: usize,

    /// Highest score seen across all episodes
    best_score: u32,

    /// Window size for rolling averages
    window_size: usize,
}

impl TrainingStats {
    /// Create a tracker keeping the last `window_size` values
    pub fn new(window_size: usize) -> Self {
        Self {
            episode_rewards: VecDeque::with_capacity(window_size),
            episode_lengths: VecDeque::with_capacity(window_size),
            episode_scores: VecDeque::with_capacity(window_size),
            losses: VecDeque::with_capacity(window_size),
            total_episodes: 0,
            total_steps: 0,
            best_score: 0,
            window_size,
        }
    }

    /// Record the completion of an episode
    ///
    /// Returns `true` when the episode set a new best score.
    pub fn record_episode(&mut self, reward: f32, length: usize, score: u32) -> bool {
        Self::push_deque(&mut self.episode_rewards, reward, self.window_size);
        Self::push_deque(&mut self.episode_lengths, length, self.window_size);
        Self::push_deque(&mut self.episode_scores, score, self.window_size);
        self.total_episodes += 1;
        self.total_steps += length;

        if score > self.best_score {
            self.best_score = score;
            true
        } else {
            false
        }
    }

    /// Record a training loss
    pub fn record_loss(&mut self, loss: f32) {
        Self::push_deque(&mut self.losses, loss, self.window_size);
    }

    /// Mean episode reward over the rolling window, 0.0 when empty
    pub fn mean_episode_reward(&self) -> f32 {
        Self::mean(&self.episode_rewards)
    }

    /// Mean episode length over the rolling window
    pub fn mean_episode_length(&self) -> f32 {
        if self.episode_lengths.is_empty() {
            0.0
        } else {
            self.episode_lengths.iter().sum::<usize>() as f32 / self.episode_lengths.len() as f32
        }
    }

    /// Mean episode score over the rolling window
    pub fn mean_episode_score(&self) -> f32 {
        if self.episode_scores.is_empty() {
            0.0
        } else {
            self.episode_scores.iter().sum::<u32>() as f32 / self.episode_scores.len() as f32
        }
    }

    /// Mean training loss over the rolling window, 0.0 when empty
    pub fn mean_loss(&self) -> f32 {
        Self::mean(&self.losses)
    }

    /// Total number of episodes completed
    pub fn total_episodes(&self) -> usize {
        self.total_episodes
    }

    /// Total number of environment steps taken
    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// Highest score seen so far
    pub fn best_score(&self) -> u32 {
        self.best_score
    }

    /// Window size for rolling averages
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Format a one-line summary of the current statistics
    pub fn format_summary(&self) -> String {
        format!(
            "Episodes: {} | Steps: {} | Reward: {:.2} | Score: {:.2} | Best: {} | Len: {:.1} | Loss: {:.4}",
            self.total_episodes,
            self.total_steps,
            self.mean_episode_reward(),
            self.mean_episode_score(),
            self.best_score,
            self.mean_episode_length(),
            self.mean_loss(),
        )
    }

    fn mean(deque: &VecDeque<f32>) -> f32 {
        if deque.is_empty() {
            0.0
        } else {
            deque.iter().sum::<f32>() / deque.len() as f32
        }
    }

    fn push_deque<T>(deque: &mut VecDeque<T>, value: T, window_size: usize) {
        if deque.len() >= window_size {
            deque.pop_front();
        }
        deque.push_back(value);
    }
}
