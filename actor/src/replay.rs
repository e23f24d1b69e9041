//! In-memory replay buffer of finished self-play games
//!
//! Games are kept in a FIFO window of `window_size` entries shared between
//! the self-play actors (append) and the trainer (sample). Sampling picks
//! games with probability proportional to their length, then a uniform
//! position within the game, which is a uniform draw over stored positions.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use games_subtraction::{GameError, StateIndex, SubtractionGame};
use network::TrainingSample;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Replay buffer is empty")]
    EmptyBuffer,

    #[error("Cannot sample: {0}")]
    DegenerateDistribution(String),

    #[error("Malformed game record: {0}")]
    Game(#[from] GameError),

    #[error("Replay buffer lock poisoned")]
    Poisoned,
}

/// Bounded FIFO of finished games.
#[derive(Debug)]
pub struct ReplayBuffer {
    window_size: usize,
    games: Mutex<VecDeque<Arc<SubtractionGame>>>,
    /// Games ever saved, including evicted ones
    total_saved: AtomicU64,
}

impl ReplayBuffer {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size,
            games: Mutex::new(VecDeque::with_capacity(window_size.min(4096))),
            total_saved: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, VecDeque<Arc<SubtractionGame>>>, ReplayError> {
        self.games.lock().map_err(|_| ReplayError::Poisoned)
    }

    /// Append a finished game, evicting the oldest ones beyond the window.
    pub fn save(&self, game: SubtractionGame) -> Result<(), ReplayError> {
        let mut games = self.lock()?;
        games.push_back(Arc::new(game));
        while games.len() > self.window_size {
            games.pop_front();
        }
        self.total_saved.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.lock().map(|games| games.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn total_saved(&self) -> u64 {
        self.total_saved.load(Ordering::Relaxed)
    }

    /// Stored games, oldest first.
    pub fn games(&self) -> Result<Vec<Arc<SubtractionGame>>, ReplayError> {
        Ok(self.lock()?.iter().cloned().collect())
    }

    /// Draw `batch_size` training positions with replacement.
    ///
    /// Each game is weighted by its number of moves; within a game the
    /// position is uniform. The target is the outcome for the player to
    /// move at that position plus the visit distribution recorded there.
    pub fn sample_batch<R: Rng + ?Sized>(
        &self,
        batch_size: usize,
        rng: &mut R,
    ) -> Result<Vec<TrainingSample>, ReplayError> {
        let picked: Vec<Arc<SubtractionGame>> = {
            let games = self.lock()?;
            if games.is_empty() {
                return Err(ReplayError::EmptyBuffer);
            }

            let dist = WeightedIndex::new(games.iter().map(|g| g.len())).map_err(|e| {
                ReplayError::DegenerateDistribution(format!(
                    "no game in the buffer has a move ({})",
                    e
                ))
            })?;

            (0..batch_size)
                .map(|_| Arc::clone(&games[dist.sample(rng)]))
                .collect()
        };

        picked
            .iter()
            .map(|game| {
                let index = rng.gen_range(0..game.len());
                let observation = game.encode(StateIndex::Ply(index))?;
                let (value, policy) = game.make_target(index)?;
                Ok(TrainingSample {
                    observation,
                    value,
                    policy,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use games_subtraction::{Board, Rules, NUM_ACTIONS};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    /// Game on an all-`n` board played with row 0 subtractions of 1.
    fn played_game(n: u32, moves: usize) -> SubtractionGame {
        let mut game = SubtractionGame::from_board(Rules::default(), Board::from_rows([[n; 3]; 3]));
        for _ in 0..moves {
            let mut visits = [0.0; NUM_ACTIONS];
            visits[0] = 1.0;
            game.apply(0).unwrap();
            game.store_search_statistics(visits);
        }
        game
    }

    #[test]
    fn test_empty_buffer_sampling_fails() {
        let buffer = ReplayBuffer::new(4);
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        assert!(matches!(
            buffer.sample_batch(8, &mut rng),
            Err(ReplayError::EmptyBuffer)
        ));
    }

    #[test]
    fn test_fifo_eviction() {
        let window = 3;
        let buffer = ReplayBuffer::new(window);

        for k in 0..(window + 4) {
            buffer.save(played_game(10 + k as u32, 1)).unwrap();
            assert!(buffer.len() <= window);
        }

        assert_eq!(buffer.len(), window);
        assert_eq!(buffer.total_saved(), 7);

        let initials: Vec<u32> = buffer
            .games()
            .unwrap()
            .iter()
            .map(|g| g.initial_board().cell(0, 0))
            .collect();
        assert_eq!(initials, vec![14, 15, 16]);
    }

    #[test]
    fn test_zero_length_games_are_degenerate() {
        let buffer = ReplayBuffer::new(4);
        buffer.save(played_game(5, 0)).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        assert!(matches!(
            buffer.sample_batch(2, &mut rng),
            Err(ReplayError::DegenerateDistribution(_))
        ));
    }

    #[test]
    fn test_sample_targets() {
        let buffer = ReplayBuffer::new(8);
        let game = played_game(1, 1);
        assert!(game.terminal());
        buffer.save(game).unwrap();

        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let batch = buffer.sample_batch(5, &mut rng).unwrap();

        assert_eq!(batch.len(), 5);
        for sample in &batch {
            assert_eq!(sample.observation, [1.0; 9]);
            // First player spent 1 and cleared row 0
            assert!((sample.value - 9.0).abs() < 1e-6);
            assert!((sample.policy[0] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_sampling_weighted_by_length() {
        let buffer = ReplayBuffer::new(8);
        buffer.save(played_game(50, 1)).unwrap();
        buffer.save(played_game(60, 9)).unwrap();

        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let batch = buffer.sample_batch(2000, &mut rng).unwrap();

        // Row 0 of the long game starts at 60; first cell of the short one is 50
        let from_long = batch.iter().filter(|s| s.observation[4] == 60.0).count();
        let share = from_long as f64 / batch.len() as f64;
        assert!((share - 0.9).abs() < 0.05, "share of long game = {share}");
    }

    #[test]
    fn test_concurrent_saves() {
        let buffer = Arc::new(ReplayBuffer::new(100));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let buffer = Arc::clone(&buffer);
                std::thread::spawn(move || {
                    for k in 0..10 {
                        buffer.save(played_game(20 + t * 10 + k, 1)).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(buffer.len(), 40);
    }
}
