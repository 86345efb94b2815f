//! Per-slot entity state machine.

use std::time::Duration;

use wegen_arcade_core::{EntityKind, EntityTypeDef, SlotId, SlotRegion, SlotSnapshot};

/// Result of a hit delivered to a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SlotHit {
    /// The slot was hidden, so the hit had no effect.
    Ignored,
    /// The occupant needs more hits before it is completed.
    Partial {
        kind: EntityKind,
        hits_remaining: u32,
    },
    /// The occupant received its final hit and the slot is hidden again.
    Completed { kind: EntityKind },
}

/// One grid position. Hidden slots carry no occupant and no timer.
#[derive(Clone, Debug)]
pub(crate) struct Slot {
    id: SlotId,
    region: SlotRegion,
    occupant: Option<EntityKind>,
    hits_remaining: u32,
    hold_remaining: Option<Duration>,
}

impl Slot {
    pub(crate) fn new(id: SlotId, region: SlotRegion) -> Self {
        Self {
            id,
            region,
            occupant: None,
            hits_remaining: 0,
            hold_remaining: None,
        }
    }

    pub(crate) fn id(&self) -> SlotId {
        self.id
    }

    pub(crate) fn is_visible(&self) -> bool {
        self.occupant.is_some()
    }

    pub(crate) fn set_region(&mut self, region: SlotRegion) {
        self.region = region;
    }

    /// Places the entity in the slot and arms its auto-hide timer.
    ///
    /// Returns the number of hits required, or `None` when the slot is
    /// already showing an entity or the hold duration is empty.
    pub(crate) fn show(&mut self, definition: &EntityTypeDef, hold: Duration) -> Option<u32> {
        if self.is_visible() || hold.is_zero() {
            return None;
        }

        self.occupant = Some(definition.kind());
        self.hits_remaining = definition.hits_required().max(1);
        self.hold_remaining = Some(hold);
        Some(self.hits_remaining)
    }

    /// Applies one hit. The auto-hide timer is cancelled when the occupant completes.
    pub(crate) fn hit(&mut self) -> SlotHit {
        let Some(kind) = self.occupant else {
            return SlotHit::Ignored;
        };

        self.hits_remaining = self.hits_remaining.saturating_sub(1);
        if self.hits_remaining > 0 {
            return SlotHit::Partial {
                kind,
                hits_remaining: self.hits_remaining,
            };
        }

        self.hide();
        SlotHit::Completed { kind }
    }

    /// Runs the auto-hide timer, returning the occupant if it timed out.
    pub(crate) fn advance(&mut self, dt: Duration) -> Option<EntityKind> {
        let remaining = self.hold_remaining?;
        let remaining = remaining.saturating_sub(dt);
        if !remaining.is_zero() {
            self.hold_remaining = Some(remaining);
            return None;
        }

        let kind = self.occupant;
        self.hide();
        kind
    }

    /// Force-hides the slot, returning the occupant it displayed.
    pub(crate) fn clear(&mut self) -> Option<EntityKind> {
        let kind = self.occupant;
        self.hide();
        kind
    }

    pub(crate) fn snapshot(&self) -> SlotSnapshot {
        SlotSnapshot {
            id: self.id,
            region: self.region,
            occupant: self.occupant,
            hits_remaining: self.hits_remaining,
            visible: self.is_visible(),
            hold_remaining: self.hold_remaining,
        }
    }

    fn hide(&mut self) {
        self.occupant = None;
        self.hits_remaining = 0;
        self.hold_remaining = None;
    }
}
