//! Pickup collection and respawn
//!
//! Collection is idempotent per instance: the collected flag is the guard,
//! and a replacement is scheduled against the current world epoch so timers
//! from a torn-down layout never fire into the new one.

use rand::Rng;

use crate::game::objects::{ObjectId, Pickup, PickupKind, PlayerId};
use crate::game::placement;
use crate::game::state::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectOutcome {
    /// Coin granted; the new score is persisted immediately by the caller
    Coin { score: i64 },
    /// Ammo granted, capped
    Ammo { ammo: u32 },
    /// Bait granted, capped
    Bait { bait: u32 },
    /// Bait inventory full; the item stays on the field
    AtCapacity { bait: u32 },
    /// Another collect got here first; no-op
    AlreadyCollected,
    UnknownItem,
    UnknownPlayer,
}

/// Collect a pickup instance for a player
pub fn collect(
    world: &mut World,
    player_id: PlayerId,
    kind: PickupKind,
    item_id: ObjectId,
    now_ms: u64,
) -> CollectOutcome {
    let coin_score = world.config.coin_score;
    let max_ammo = world.config.max_ammo;
    let ammo_pack = world.config.ammo_pack_amount;
    let max_bait = world.config.max_bait;

    let Some(player_bait) = world.get_player(player_id).map(|p| p.bait) else {
        return CollectOutcome::UnknownPlayer;
    };
    let Some(index) = world
        .objects
        .pickups_of(kind)
        .iter()
        .position(|p| p.id == item_id)
    else {
        return CollectOutcome::UnknownItem;
    };
    if world.objects.pickups_of(kind)[index].collected {
        return CollectOutcome::AlreadyCollected;
    }
    if kind == PickupKind::Bait && player_bait >= max_bait {
        return CollectOutcome::AtCapacity { bait: player_bait };
    }

    let origin = world.objects.pickups_of(kind)[index].position;
    world.objects.pickups_of_mut(kind)[index].collected = true;
    world.schedule_respawn(kind, now_ms + kind.respawn_delay_ms(), origin);

    match world.get_player_mut(player_id) {
        Some(player) => match kind {
            PickupKind::Coin => {
                player.score += coin_score;
                CollectOutcome::Coin {
                    score: player.score,
                }
            }
            PickupKind::Ammo => {
                player.ammo = (player.ammo + ammo_pack).min(max_ammo);
                CollectOutcome::Ammo { ammo: player.ammo }
            }
            PickupKind::Bait => {
                player.bait = (player.bait + 1).min(max_bait);
                CollectOutcome::Bait { bait: player.bait }
            }
        },
        None => CollectOutcome::UnknownPlayer,
    }
}

/// Fire due respawn timers. Each live timer prunes the collected instances
/// of its kind and places one replacement; stale-epoch timers are dropped.
/// Returns how many replacements were placed.
pub fn process_respawns(world: &mut World, now_ms: u64, rng: &mut impl Rng) -> u32 {
    let due = world.take_due_respawns(now_ms);
    let mut respawned = 0;
    for pending in due {
        if pending.epoch != world.epoch {
            tracing::debug!(kind = ?pending.kind, "dropping respawn from a previous epoch");
            continue;
        }
        let kind = pending.kind;
        let position = match kind {
            PickupKind::Bait => placement::find_bait_respawn_position(
                pending.origin,
                &world.objects,
                &world.config,
                rng,
            ),
            _ => placement::find_valid_position(kind.size(), &world.objects, &world.config, rng),
        };
        let id = world.alloc_object_id();
        let list = world.objects.pickups_of_mut(kind);
        list.retain(|p| !p.collected);
        list.push(Pickup::new(id, kind, position));
        respawned += 1;
    }
    respawned
}
