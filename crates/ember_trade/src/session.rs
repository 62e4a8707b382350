//! # Trade Sessions
//!
//! The negotiation state machine between two parties:
//! `proposed -> accepted -> edits -> both confirmed`. Declining is the
//! ledger's concern (it discards the session); this type only tracks the
//! offers and the confirmation flags.
//!
//! Every successful edit clears both confirmations. A confirmation given
//! against an earlier version of the offer must never carry over.

use std::collections::BTreeSet;

use ember_core::{EntityId, ItemId};

use crate::error::{TradeError, TradeResult};

/// One party's side of the table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TradeOffer {
    /// Item instances offered, ordered by id so commit order is
    /// deterministic.
    pub items: BTreeSet<ItemId>,
    /// Gold offered.
    pub gold: u64,
    /// Whether this party has confirmed the current offer pair.
    pub confirmed: bool,
}

/// A two-party trade negotiation.
#[derive(Clone, Debug)]
pub struct TradeSession {
    /// Proposer first, counterparty second.
    parties: [EntityId; 2],
    offers: [TradeOffer; 2],
    accepted: bool,
}

impl TradeSession {
    /// Creates a proposed session. `proposer` goes first in party order.
    #[must_use]
    pub fn new(proposer: EntityId, counterparty: EntityId) -> Self {
        Self {
            parties: [proposer, counterparty],
            offers: [TradeOffer::default(), TradeOffer::default()],
            accepted: false,
        }
    }

    /// The proposing party.
    #[must_use]
    pub fn proposer(&self) -> EntityId {
        self.parties[0]
    }

    /// Both parties, proposer first.
    #[must_use]
    pub fn parties(&self) -> [EntityId; 2] {
        self.parties
    }

    /// True if either side of the table is this entity.
    #[must_use]
    pub fn involves(&self, party: EntityId) -> bool {
        self.parties.contains(&party)
    }

    /// The other side of the table.
    ///
    /// # Errors
    ///
    /// Returns [`TradeError::NoSession`] if `party` is not at this table.
    pub fn counterparty(&self, party: EntityId) -> TradeResult<EntityId> {
        let index = self.index_of(party)?;
        Ok(self.parties[1 - index])
    }

    /// A party's current offer.
    ///
    /// # Errors
    ///
    /// Returns [`TradeError::NoSession`] if `party` is not at this table.
    pub fn offer(&self, party: EntityId) -> TradeResult<&TradeOffer> {
        Ok(&self.offers[self.index_of(party)?])
    }

    /// True once the counterparty has accepted the proposal.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    /// Accepts the proposal, opening the offers for editing.
    ///
    /// # Errors
    ///
    /// Returns [`TradeError::ProposerCannotAccept`] if the proposer tries
    /// to accept their own proposal.
    pub fn accept(&mut self, party: EntityId) -> TradeResult<()> {
        self.index_of(party)?;
        if party == self.parties[0] {
            return Err(TradeError::ProposerCannotAccept(party));
        }
        self.accepted = true;
        Ok(())
    }

    /// Adds an item to the party's offer. Idempotent per item id.
    ///
    /// # Errors
    ///
    /// Returns [`TradeError::NotAccepted`] before acceptance.
    pub fn add_item(&mut self, party: EntityId, item: ItemId) -> TradeResult<()> {
        let index = self.editable_index(party)?;
        self.offers[index].items.insert(item);
        self.reset_confirmations();
        Ok(())
    }

    /// Removes an item from the party's offer.
    ///
    /// # Errors
    ///
    /// Returns [`TradeError::NotOffered`] if the item was not offered, or
    /// [`TradeError::NotAccepted`] before acceptance.
    pub fn remove_item(&mut self, party: EntityId, item: ItemId) -> TradeResult<()> {
        let index = self.editable_index(party)?;
        if !self.offers[index].items.remove(&item) {
            return Err(TradeError::NotOffered { party, item });
        }
        self.reset_confirmations();
        Ok(())
    }

    /// Replaces the party's gold offer.
    ///
    /// # Errors
    ///
    /// Returns [`TradeError::NotAccepted`] before acceptance.
    pub fn set_gold(&mut self, party: EntityId, amount: u64) -> TradeResult<()> {
        let index = self.editable_index(party)?;
        self.offers[index].gold = amount;
        self.reset_confirmations();
        Ok(())
    }

    /// Confirms the party's side. Returns true once both sides have
    /// confirmed the same offer pair.
    ///
    /// # Errors
    ///
    /// Returns [`TradeError::NotAccepted`] before acceptance.
    pub fn confirm(&mut self, party: EntityId) -> TradeResult<bool> {
        let index = self.editable_index(party)?;
        self.offers[index].confirmed = true;
        Ok(self.offers.iter().all(|offer| offer.confirmed))
    }

    fn index_of(&self, party: EntityId) -> TradeResult<usize> {
        self.parties
            .iter()
            .position(|id| *id == party)
            .ok_or(TradeError::NoSession(party))
    }

    fn editable_index(&self, party: EntityId) -> TradeResult<usize> {
        let index = self.index_of(party)?;
        if !self.accepted {
            return Err(TradeError::NotAccepted);
        }
        Ok(index)
    }

    fn reset_confirmations(&mut self) {
        for offer in &mut self.offers {
            offer.confirmed = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edits_rejected_before_acceptance() {
        let mut session = TradeSession::new(1, 2);
        assert!(matches!(
            session.add_item(1, 7),
            Err(TradeError::NotAccepted)
        ));
        assert!(matches!(session.set_gold(2, 5), Err(TradeError::NotAccepted)));
    }

    #[test]
    fn test_proposer_cannot_accept_own_proposal() {
        let mut session = TradeSession::new(1, 2);
        assert!(matches!(
            session.accept(1),
            Err(TradeError::ProposerCannotAccept(1))
        ));
        session.accept(2).unwrap();
        assert!(session.is_accepted());
    }

    #[test]
    fn test_edit_resets_both_confirmations() {
        let mut session = TradeSession::new(1, 2);
        session.accept(2).unwrap();
        assert!(!session.confirm(1).unwrap());
        assert!(session.confirm(2).unwrap());

        session.set_gold(1, 10).unwrap();
        assert!(!session.offer(1).unwrap().confirmed);
        assert!(!session.offer(2).unwrap().confirmed);
        // Both must confirm again from scratch.
        assert!(!session.confirm(2).unwrap());
        assert!(session.confirm(1).unwrap());
    }

    #[test]
    fn test_remove_unoffered_item_is_rejected() {
        let mut session = TradeSession::new(1, 2);
        session.accept(2).unwrap();
        assert!(matches!(
            session.remove_item(1, 7),
            Err(TradeError::NotOffered { party: 1, item: 7 })
        ));
    }

    #[test]
    fn test_counterparty_lookup() {
        let session = TradeSession::new(1, 2);
        assert_eq!(session.counterparty(1).unwrap(), 2);
        assert_eq!(session.counterparty(2).unwrap(), 1);
        assert!(matches!(
            session.counterparty(3),
            Err(TradeError::NoSession(3))
        ));
    }
}
