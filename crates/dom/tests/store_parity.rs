use dom::snapshot::TreeSnapshot;
use dom::{ArenaStore, LinearStore, ObjectLog, OffscreenDocument, UniqueId};
use dom_test_support::{assert_lines_eq, load_scenarios, scenario_fixtures};

#[test]
fn scenarios_match_on_both_stores() {
    let scenarios = load_scenarios(&scenario_fixtures().join("scenarios.toml"));
    assert!(!scenarios.is_empty());
    for scenario in &scenarios {
        let mut arena = OffscreenDocument::with_store(ObjectLog::new(), ArenaStore::new());
        let mut linear = OffscreenDocument::with_store(ObjectLog::new(), LinearStore::new());
        let arena_run = scenario.run(&mut arena);
        let linear_run = scenario.run(&mut linear);

        assert_eq!(arena_run.error, scenario.expect_error, "{}", scenario.name);
        assert_eq!(linear_run.error, scenario.expect_error, "{}", scenario.name);
        assert_eq!(arena_run.batches, linear_run.batches, "{}", scenario.name);
        let arena_lines = TreeSnapshot::of(&arena);
        assert_lines_eq(
            arena_lines.as_lines(),
            TreeSnapshot::of(&linear).as_lines(),
            &scenario.name,
        );
        if let Some(expected) = &scenario.expected {
            assert_lines_eq(expected, arena_lines.as_lines(), &scenario.name);
        }
    }
}

struct Lcg(u64);

impl Lcg {
    fn next_u32(&mut self) -> u32 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 32) as u32
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u32() as usize) % n.max(1)
    }
}

#[test]
fn random_edits_keep_stores_in_step() {
    for seed in 0..32u64 {
        let mut rng = Lcg(seed.wrapping_mul(0x9e37_79b9_7f4a_7c15) | 1);
        let mut arena = OffscreenDocument::with_store(ObjectLog::new(), ArenaStore::new());
        let mut linear = OffscreenDocument::with_store(ObjectLog::new(), LinearStore::new());
        let mut uids = vec![UniqueId::ROOT];

        for step in 0..150 {
            let choice = rng.below(6);
            let a = uids[rng.below(uids.len())];
            let b = uids[rng.below(uids.len())];
            let value = format!("v{}", rng.below(10));
            let (left, right) = match choice {
                0 => {
                    let x = arena.create_element("view");
                    let y = linear.create_element("view");
                    assert_eq!(x, y);
                    uids.push(x);
                    (Ok(()), Ok(()))
                }
                1 => (
                    arena.set_attribute(a, "data", &value),
                    linear.set_attribute(a, "data", &value),
                ),
                2 => (arena.append(a, &[b]), linear.append(a, &[b])),
                3 => (arena.remove(a), linear.remove(a)),
                4 => (
                    arena.set_style_property(a, "width", &value, false),
                    linear.set_style_property(a, "width", &value, false),
                ),
                _ => (arena.replace_with(a, &[b]), linear.replace_with(a, &[b])),
            };
            assert_eq!(left, right, "seed {seed} step {step}");
        }

        assert_eq!(arena.commit(), linear.commit(), "seed {seed}");
        assert_lines_eq(
            TreeSnapshot::of(&arena).as_lines(),
            TreeSnapshot::of(&linear).as_lines(),
            &format!("seed {seed}"),
        );
    }
}
