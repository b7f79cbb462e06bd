//! Seeded differential test: two replicas make randomized concurrent
//! edits, exchange their change packs once, and must converge to the same
//! serialized state.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use docweave::{ActorID, Checkpoint, DocState, Document, Pack};

const ACTOR_LEN: usize = docweave::clock::ACTOR_ID_LEN;
const KEYS: [&str; 6] = ["alpha", "beta", "gamma", "delta", "epsilon", "zeta"];

fn actor(last: u8) -> ActorID {
    let mut bytes = [0u8; ACTOR_LEN];
    bytes[ACTOR_LEN - 1] = last;
    ActorID::from_bytes(bytes)
}

fn attached(a: u8) -> Document {
    let mut doc = Document::new("bench", "doc");
    doc.set_actor(actor(a));
    doc.update_state(DocState::Attached);
    doc
}

fn random_edit(doc: &mut Document, rng: &mut StdRng, round: usize) {
    let key = KEYS[rng.gen_range(0..KEYS.len())];
    let kind = rng.gen_range(0..5);
    doc.update("", |root| {
        match kind {
            0 => root.set_string(key, &format!("s{round}")),
            1 => root.set_integer(key, round as i64),
            2 => root.set_bool(key, round % 2 == 0),
            3 => {
                let mut nested = root.set_new_object(key);
                nested.set_integer("round", round as i64);
            }
            _ => root.remove(key),
        }
        Ok(())
    })
    .unwrap();
}

fn exchange(left: &mut Document, right: &mut Document) {
    let from_left = left.create_change_pack().changes;
    let from_right = right.create_change_pack().changes;

    let server_seq = (from_left.len() + from_right.len()) as u64;
    right
        .apply_change_pack(&Pack::new(
            right.key().clone(),
            Checkpoint::new(server_seq, 0),
            from_left,
            None,
        ))
        .unwrap();
    left.apply_change_pack(&Pack::new(
        left.key().clone(),
        Checkpoint::new(server_seq, 0),
        from_right,
        None,
    ))
    .unwrap();
}

#[test]
fn randomized_concurrent_edits_converge() {
    for seed in 0..8u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut doc_a = attached(1);
        let mut doc_b = attached(2);

        for round in 0..24 {
            random_edit(&mut doc_a, &mut rng, round);
            random_edit(&mut doc_b, &mut rng, round);
        }

        exchange(&mut doc_a, &mut doc_b);
        assert_eq!(
            doc_a.marshal(),
            doc_b.marshal(),
            "replicas diverged for seed {seed}"
        );
    }
}

#[test]
fn application_order_does_not_matter() {
    // Build one set of changes, apply it to two fresh replicas in
    // opposite orders; the serialized states must match.
    let mut source_a = attached(1);
    let mut source_b = attached(2);
    let mut rng = StdRng::seed_from_u64(42);
    for round in 0..12 {
        random_edit(&mut source_a, &mut rng, round);
        random_edit(&mut source_b, &mut rng, round);
    }
    let changes_a = source_a.create_change_pack().changes;
    let changes_b = source_b.create_change_pack().changes;

    let mut forward = attached(3);
    forward
        .apply_change_pack(&Pack::new(
            forward.key().clone(),
            Checkpoint::new(1, 0),
            changes_a.clone(),
            None,
        ))
        .unwrap();
    forward
        .apply_change_pack(&Pack::new(
            forward.key().clone(),
            Checkpoint::new(2, 0),
            changes_b.clone(),
            None,
        ))
        .unwrap();

    let mut reverse = attached(4);
    reverse
        .apply_change_pack(&Pack::new(
            reverse.key().clone(),
            Checkpoint::new(1, 0),
            changes_b,
            None,
        ))
        .unwrap();
    reverse
        .apply_change_pack(&Pack::new(
            reverse.key().clone(),
            Checkpoint::new(2, 0),
            changes_a,
            None,
        ))
        .unwrap();

    assert_eq!(forward.marshal(), reverse.marshal());
}
