//! Energy pool and hand shared by every ally unit
//!
//! Only one ally acts per turn, but they all draw from one hand and one energy
//! pool. The match owns the single instance and pushes copies to each ally
//! after every change.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::cards::{CardKind, CardTable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedPlayerState {
    hand: Vec<CardKind>,
    energy: u32,
    max_energy: u32,
    /// Max energy before per-turn growth (raised by buffs)
    base_max_energy: u32,
    /// Base value restored by a full reset
    initial_base: u32,
    /// Max energy gained per ally turn
    energy_per_turn: u32,
    turns_played: u32,
    hand_size: usize,
}

impl SharedPlayerState {
    pub fn new(base_max_energy: u32, energy_per_turn: u32, hand_size: usize) -> Self {
        Self {
            hand: Vec::with_capacity(hand_size),
            energy: 0,
            max_energy: base_max_energy,
            base_max_energy,
            initial_base: base_max_energy,
            energy_per_turn,
            turns_played: 0,
            hand_size,
        }
    }

    pub fn hand(&self) -> &[CardKind] {
        &self.hand
    }

    #[inline]
    pub fn energy(&self) -> u32 {
        self.energy
    }

    #[inline]
    pub fn max_energy(&self) -> u32 {
        self.max_energy
    }

    #[inline]
    pub fn turns_played(&self) -> u32 {
        self.turns_played
    }

    #[inline]
    pub fn hand_size(&self) -> usize {
        self.hand_size
    }

    /// Match start: full energy at the base maximum and a full hand
    pub fn seed<R: Rng + ?Sized>(&mut self, table: &CardTable, rng: &mut R) {
        self.turns_played = 0;
        self.max_energy = self.base_max_energy;
        self.energy = self.max_energy;
        self.refill_hand(table, rng);
    }

    /// An ally unit starts its turn: max energy grows, energy refills, hand tops up
    pub fn begin_ally_turn<R: Rng + ?Sized>(&mut self, table: &CardTable, rng: &mut R) {
        self.turns_played += 1;
        self.max_energy = self
            .max_energy
            .max(self.base_max_energy + self.turns_played * self.energy_per_turn);
        self.energy = self.max_energy;
        self.refill_hand(table, rng);
    }

    pub fn refill_hand<R: Rng + ?Sized>(&mut self, table: &CardTable, rng: &mut R) {
        while self.hand.len() < self.hand_size {
            self.hand.push(table.draw(rng));
        }
    }

    #[inline]
    pub fn can_afford(&self, cost: u32) -> bool {
        self.energy >= cost
    }

    /// Spend energy, clamping at zero
    pub fn consume_energy(&mut self, amount: u32) {
        self.energy = self.energy.saturating_sub(amount);
    }

    pub fn take_card(&mut self, index: usize) -> Option<CardKind> {
        (index < self.hand.len()).then(|| self.hand.remove(index))
    }

    /// At least one card in hand can be paid for. An empty hand never can.
    pub fn has_playable(&self, table: &CardTable) -> bool {
        table
            .cheapest_cost(&self.hand)
            .is_some_and(|cheapest| self.energy >= cheapest)
    }

    /// Permanent max-energy boost, refilling the pool
    pub fn buff(&mut self, amount: u32) {
        self.base_max_energy += amount;
        self.max_energy += amount;
        self.energy = self.max_energy;
    }

    /// Back to the configured starting values with an empty hand
    pub fn reset(&mut self) {
        self.hand.clear();
        self.base_max_energy = self.initial_base;
        self.max_energy = self.initial_base;
        self.energy = 0;
        self.turns_played = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn pool() -> (SharedPlayerState, CardTable, Pcg32) {
        (
            SharedPlayerState::new(3, 1, 4),
            CardTable::default(),
            Pcg32::seed_from_u64(11),
        )
    }

    #[test]
    fn test_seed_fills_hand_and_energy() {
        let (mut shared, table, mut rng) = pool();
        shared.seed(&table, &mut rng);
        assert_eq!(shared.hand().len(), 4);
        assert_eq!(shared.energy(), 3);
        assert_eq!(shared.max_energy(), 3);
    }

    #[test]
    fn test_max_energy_after_two_ally_turns() {
        let (mut shared, table, mut rng) = pool();
        shared.seed(&table, &mut rng);
        shared.begin_ally_turn(&table, &mut rng);
        assert_eq!(shared.max_energy(), 4);
        shared.begin_ally_turn(&table, &mut rng);
        assert_eq!(shared.max_energy(), 5);
        assert_eq!(shared.energy(), 5);
    }

    #[test]
    fn test_take_card_and_refill() {
        let (mut shared, table, mut rng) = pool();
        shared.seed(&table, &mut rng);
        let first = shared.hand()[0];
        assert_eq!(shared.take_card(0), Some(first));
        assert_eq!(shared.hand().len(), 3);
        assert_eq!(shared.take_card(9), None);
        shared.refill_hand(&table, &mut rng);
        assert_eq!(shared.hand().len(), 4);
    }

    #[test]
    fn test_has_playable() {
        let (mut shared, table, mut rng) = pool();
        assert!(!shared.has_playable(&table), "empty hand is never playable");
        shared.seed(&table, &mut rng);
        shared.consume_energy(100);
        assert_eq!(shared.energy(), 0);
        assert!(!shared.has_playable(&table));
    }

    #[test]
    fn test_buff_survives_turn_growth_until_reset() {
        let (mut shared, table, mut rng) = pool();
        shared.seed(&table, &mut rng);
        shared.buff(2);
        assert_eq!(shared.max_energy(), 5);
        shared.begin_ally_turn(&table, &mut rng);
        assert_eq!(shared.max_energy(), 6);
        shared.reset();
        assert_eq!(shared.max_energy(), 3);
        assert!(shared.hand().is_empty());
    }
}
