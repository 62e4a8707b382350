//! # The Trade Ledger
//!
//! Wires trade sessions to the world: proposal and acceptance, offer
//! edits validated against actual holdings, and the final settlement
//! through an [`AtomicTransaction`] under a single world write lock.
//!
//! A session that reaches commit is removed from the ledger first and
//! never reinstated: a failed settlement rolls the world back and reports
//! the error, a successful one persists both parties, and either way the
//! negotiation is over.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use ember_core::{
    CoreError, EntityId, ItemId, NotificationSink, NotifyTarget, PersistenceSink, SharedWorld,
    World,
};

use crate::error::{TradeError, TradeResult};
use crate::session::TradeSession;
use crate::transaction::AtomicTransaction;

/// Manager of all open trade negotiations.
pub struct TradeLedger {
    world: SharedWorld,
    notifier: Arc<dyn NotificationSink>,
    store: Arc<dyn PersistenceSink>,
    /// Open sessions. A party appears in at most one.
    sessions: Mutex<Vec<TradeSession>>,
}

impl TradeLedger {
    /// Creates a ledger with no open sessions.
    #[must_use]
    pub fn new(
        world: SharedWorld,
        notifier: Arc<dyn NotificationSink>,
        store: Arc<dyn PersistenceSink>,
    ) -> Self {
        Self {
            world,
            notifier,
            store,
            sessions: Mutex::new(Vec::new()),
        }
    }

    /// Proposes a trade between two parties.
    ///
    /// # Errors
    ///
    /// Returns [`TradeError::SelfTrade`], [`TradeError::PartyBusy`] if
    /// either party already trades, or a [`TradeError::Core`] failure if
    /// either lacks holdings.
    pub fn create(&self, proposer: EntityId, counterparty: EntityId) -> TradeResult<()> {
        if proposer == counterparty {
            return Err(TradeError::SelfTrade(proposer));
        }
        let proposer_name = {
            let world = self.world.read();
            world.holdings(proposer)?;
            world.holdings(counterparty)?;
            world.entity(proposer)?.name.clone()
        };
        {
            let mut sessions = self.sessions.lock();
            for session in sessions.iter() {
                for party in [proposer, counterparty] {
                    if session.involves(party) {
                        return Err(TradeError::PartyBusy(party));
                    }
                }
            }
            sessions.push(TradeSession::new(proposer, counterparty));
        }
        debug!(proposer, counterparty, "trade proposed");
        self.notifier.notify(
            NotifyTarget::Entity(counterparty),
            &format!("{proposer_name} proposes a trade with you."),
        );
        Ok(())
    }

    /// Accepts a proposal, opening the offers for editing.
    ///
    /// # Errors
    ///
    /// Returns [`TradeError::NoSession`] or
    /// [`TradeError::ProposerCannotAccept`].
    pub fn accept(&self, party: EntityId) -> TradeResult<()> {
        let proposer = {
            let mut sessions = self.sessions.lock();
            let session = Self::find(&mut sessions, party)?;
            session.accept(party)?;
            session.proposer()
        };
        self.notifier.notify(
            NotifyTarget::Entity(proposer),
            &format!("{} accepts your trade.", self.name(party)),
        );
        Ok(())
    }

    /// Declines or cancels the party's trade from any pre-commit state.
    /// The session is discarded; offers were never applied to the world.
    ///
    /// # Errors
    ///
    /// Returns [`TradeError::NoSession`] if the party is not trading.
    pub fn decline(&self, party: EntityId) -> TradeResult<()> {
        let session = {
            let mut sessions = self.sessions.lock();
            let index = sessions
                .iter()
                .position(|s| s.involves(party))
                .ok_or(TradeError::NoSession(party))?;
            sessions.remove(index)
        };
        debug!(party, "trade declined");
        for id in session.parties() {
            self.notifier
                .notify(NotifyTarget::Entity(id), "The trade was declined.");
        }
        Ok(())
    }

    /// Adds an item the party actually holds to their offer.
    ///
    /// # Errors
    ///
    /// Returns a [`TradeError::Core`] item failure if not held, plus the
    /// session errors of an edit.
    pub fn add_item(&self, party: EntityId, item: ItemId) -> TradeResult<()> {
        if !self.world.read().holdings(party)?.holds(item) {
            return Err(TradeError::Core(CoreError::ItemNotFound {
                owner: party,
                item,
            }));
        }
        let other = {
            let mut sessions = self.sessions.lock();
            let session = Self::find(&mut sessions, party)?;
            session.add_item(party, item)?;
            session.counterparty(party)?
        };
        self.notify_offer_changed(party, other);
        Ok(())
    }

    /// Removes an item from the party's offer.
    ///
    /// # Errors
    ///
    /// Returns [`TradeError::NotOffered`] plus the session errors of an
    /// edit.
    pub fn remove_item(&self, party: EntityId, item: ItemId) -> TradeResult<()> {
        let other = {
            let mut sessions = self.sessions.lock();
            let session = Self::find(&mut sessions, party)?;
            session.remove_item(party, item)?;
            session.counterparty(party)?
        };
        self.notify_offer_changed(party, other);
        Ok(())
    }

    /// Replaces the party's gold offer, validated against their purse.
    ///
    /// # Errors
    ///
    /// Returns a [`TradeError::Core`] gold failure if the purse cannot
    /// cover the amount, plus the session errors of an edit.
    pub fn set_gold(&self, party: EntityId, amount: u64) -> TradeResult<()> {
        let available = self.world.read().holdings(party)?.gold;
        if available < amount {
            return Err(TradeError::Core(CoreError::InsufficientGold {
                owner: party,
                needed: amount,
                available,
            }));
        }
        let other = {
            let mut sessions = self.sessions.lock();
            let session = Self::find(&mut sessions, party)?;
            session.set_gold(party, amount)?;
            session.counterparty(party)?
        };
        self.notify_offer_changed(party, other);
        Ok(())
    }

    /// Confirms the party's side of the trade. When both sides have
    /// confirmed the same offer pair the trade settles immediately;
    /// returns true once settled.
    ///
    /// # Errors
    ///
    /// Session errors before settlement; a [`TradeError::Commit`] if
    /// settlement failed (the world has been rolled back and the session
    /// discarded).
    pub fn confirm(&self, party: EntityId) -> TradeResult<bool> {
        let (settled, other) = {
            let mut sessions = self.sessions.lock();
            let index = sessions
                .iter()
                .position(|s| s.involves(party))
                .ok_or(TradeError::NoSession(party))?;
            let other = sessions[index].counterparty(party)?;
            if sessions[index].confirm(party)? {
                // Settle outside the registry lock; the session never
                // returns to the ledger.
                (Some(sessions.remove(index)), other)
            } else {
                (None, other)
            }
        };
        let Some(session) = settled else {
            // Notify only after the registry lock is released.
            self.notifier.notify(
                NotifyTarget::Entity(other),
                &format!("{} confirms the trade.", self.name(party)),
            );
            return Ok(false);
        };

        match self.settle(&session) {
            Ok(()) => {
                debug!(parties = ?session.parties(), "trade committed");
                for id in session.parties() {
                    self.notifier
                        .notify(NotifyTarget::Entity(id), "The trade is complete.");
                    self.persist(id);
                }
                Ok(true)
            }
            Err(err) => {
                warn!(parties = ?session.parties(), %err, "trade settlement failed");
                for id in session.parties() {
                    self.notifier.notify(
                        NotifyTarget::Entity(id),
                        &format!("The trade failed: {err}. Everything is returned."),
                    );
                }
                Err(err)
            }
        }
    }

    /// Builds and commits the settlement transaction: per party, one
    /// operation per offered item and one gold transfer, each paired with
    /// its exact inverse.
    fn settle(&self, session: &TradeSession) -> TradeResult<()> {
        let [a, b] = session.parties();
        let mut txn: AtomicTransaction<World> = AtomicTransaction::new();
        for (sender, receiver) in [(a, b), (b, a)] {
            let offer = session.offer(sender)?;
            for item in &offer.items {
                let item = *item;
                txn.push(
                    move |world| world.transfer_item(sender, receiver, item),
                    move |world| world.transfer_item(receiver, sender, item),
                )?;
            }
            let gold = offer.gold;
            if gold > 0 {
                txn.push(
                    move |world| world.transfer_gold(sender, receiver, gold),
                    move |world| world.transfer_gold(receiver, sender, gold),
                )?;
            }
        }
        let mut world = self.world.write();
        txn.commit(&mut world)?;
        Ok(())
    }

    fn persist(&self, id: EntityId) {
        let snapshot = self.world.read().snapshot(id);
        match snapshot {
            Ok(snapshot) => {
                if let Err(err) = self.store.save(&snapshot) {
                    warn!(id, %err, "post-trade persistence failed");
                }
            }
            Err(err) => warn!(id, %err, "post-trade snapshot failed"),
        }
    }

    fn notify_offer_changed(&self, party: EntityId, other: EntityId) {
        self.notifier.notify(
            NotifyTarget::Entity(other),
            &format!("{} changes the trade offer.", self.name(party)),
        );
    }

    fn name(&self, id: EntityId) -> String {
        self.world
            .read()
            .entity(id)
            .map_or_else(|_| format!("entity {id}"), |e| e.name.clone())
    }

    fn find(sessions: &mut [TradeSession], party: EntityId) -> TradeResult<&mut TradeSession> {
        sessions
            .iter_mut()
            .find(|s| s.involves(party))
            .ok_or(TradeError::NoSession(party))
    }
}
