use log::debug;

use crate::error::Error;
use crate::model::{PlayerId, Seat};

/// The fixed set of seats at the table and who occupies them.
///
/// Seats are never renumbered: a player who leaves frees their seat, and the
/// next player to join takes the lowest free seat.
#[derive(Debug, Clone)]
pub struct SeatRegistry {
    seats: Vec<Option<PlayerId>>,
}

impl SeatRegistry {
    pub fn new(capacity: usize) -> Self {
        SeatRegistry {
            seats: vec![None; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.seats.len()
    }

    /// Seat a player at the lowest free seat.
    pub fn join(&mut self, player: PlayerId) -> Result<Seat, Error> {
        if self.seat_of(player).is_some() {
            return Err(Error::AlreadySeated);
        }
        let idx = self
            .seats
            .iter()
            .position(Option::is_none)
            .ok_or(Error::SeatsFull)?;
        self.seats[idx] = Some(player);
        debug!("{} takes seat {}", player, idx);
        Ok(Seat(idx))
    }

    /// Free the seat held by a player, if any.
    pub fn leave(&mut self, player: PlayerId) -> Option<Seat> {
        let seat = self.seat_of(player)?;
        self.seats[seat.0] = None;
        debug!("{} leaves {}", player, seat);
        Some(seat)
    }

    pub fn is_full(&self) -> bool {
        self.occupied() == self.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.occupied() == 0
    }

    pub fn occupied(&self) -> usize {
        self.seats.iter().filter(|s| s.is_some()).count()
    }

    pub fn seat_of(&self, player: PlayerId) -> Option<Seat> {
        self.seats
            .iter()
            .position(|s| *s == Some(player))
            .map(Seat)
    }

    pub fn player_at(&self, seat: Seat) -> Option<PlayerId> {
        self.seats.get(seat.0).copied().flatten()
    }

    /// Occupants by seat number.
    pub fn snapshot(&self) -> Vec<Option<PlayerId>> {
        self.seats.clone()
    }

    /// Occupied seats paired with their players, in seat order.
    pub fn players(&self) -> impl Iterator<Item = (Seat, PlayerId)> + '_ {
        self.seats
            .iter()
            .enumerate()
            .filter_map(|(idx, p)| p.map(|p| (Seat(idx), p)))
    }

    /// The first occupied seat following `seat` in rotation order, which may
    /// be `seat` itself when nobody else is seated.
    pub fn next_occupied_after(&self, seat: Seat) -> Option<Seat> {
        let n = self.capacity();
        (1..=n)
            .map(|step| Seat((seat.0 + step) % n))
            .find(|s| self.seats[s.0].is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(n: u64) -> SeatRegistry {
        let mut seats = SeatRegistry::new(5);
        for id in 0..n {
            seats.join(PlayerId(id)).unwrap();
        }
        seats
    }

    #[test]
    fn seats_fill_in_join_order() {
        let mut seats = SeatRegistry::new(5);
        for id in 0..5 {
            assert!(!seats.is_full());
            assert_eq!(seats.join(PlayerId(id)), Ok(Seat(id as usize)));
        }
        assert!(seats.is_full());
    }

    #[test]
    fn sixth_player_is_turned_away() {
        let mut seats = filled(5);
        assert_eq!(seats.join(PlayerId(5)), Err(Error::SeatsFull));
        assert_eq!(seats.occupied(), 5);
        assert_eq!(seats.seat_of(PlayerId(5)), None);
    }

    #[test]
    fn joining_twice_is_refused() {
        let mut seats = filled(2);
        assert_eq!(seats.join(PlayerId(1)), Err(Error::AlreadySeated));
    }

    #[test]
    fn freed_seat_is_reused() {
        let mut seats = filled(5);
        assert_eq!(seats.leave(PlayerId(2)), Some(Seat(2)));
        assert!(!seats.is_full());
        assert_eq!(seats.player_at(Seat(2)), None);
        assert_eq!(seats.player_at(Seat(3)), Some(PlayerId(3)));

        assert_eq!(seats.join(PlayerId(9)), Ok(Seat(2)));
        assert!(seats.is_full());
    }

    #[test]
    fn leaving_without_a_seat_is_harmless() {
        let mut seats = filled(3);
        assert_eq!(seats.leave(PlayerId(42)), None);
        assert_eq!(seats.occupied(), 3);
    }

    #[test]
    fn rotation_skips_vacant_seats() {
        let mut seats = filled(5);
        assert_eq!(seats.next_occupied_after(Seat(4)), Some(Seat(0)));
        seats.leave(PlayerId(1));
        seats.leave(PlayerId(2));
        assert_eq!(seats.next_occupied_after(Seat(0)), Some(Seat(3)));

        let mut alone = SeatRegistry::new(5);
        assert_eq!(alone.next_occupied_after(Seat(0)), None);
        alone.join(PlayerId(0)).unwrap();
        assert_eq!(alone.next_occupied_after(Seat(0)), Some(Seat(0)));
    }
}
