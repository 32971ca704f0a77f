use pawrank::identity::{clean_handle, comparison_key, AliasRule, IdentityNormalizer, MatchPolicy};
use proptest::prelude::*;

#[test]
fn normalize_strips_at_and_whitespace() {
    let normalizer = IdentityNormalizer::default();
    assert_eq!(normalizer.normalize("  @corgi_club "), "corgi_club");
    assert_eq!(normalizer.normalize("@@doodle.days"), "doodle.days");
    assert_eq!(normalizer.normalize(""), "");
}

#[test]
fn normalize_keeps_first_of_several_handles() {
    let normalizer = IdentityNormalizer::default();
    assert_eq!(normalizer.normalize("@main_account / @backup_account"), "main_account");
    assert_eq!(clean_handle("first/second/third"), "first");
}

#[test]
fn known_aliases_collapse_to_one_identity() {
    let normalizer = IdentityNormalizer::default();
    let canonical = normalizer.normalize("Adam_Wickens");
    assert_eq!(canonical, "Adam_Wickens");
    assert_eq!(normalizer.normalize("adam wickens"), canonical);
    assert_eq!(normalizer.normalize("@AdamWickens"), canonical);
    assert_eq!(normalizer.normalize("adam.wickens / adam_w"), canonical);
}

#[test]
fn configured_aliases_extend_builtin_table() {
    let normalizer = IdentityNormalizer::with_extra_aliases(vec![AliasRule::new(
        "sir_barksalot",
        &["barksalot official", "sirbarks"],
    )]);
    assert_eq!(normalizer.normalize("Barksalot Official"), "sir_barksalot");
    assert_eq!(normalizer.normalize("sirbarks"), "sir_barksalot");
    assert_eq!(normalizer.normalize("adam wickens"), "Adam_Wickens");
}

#[test]
fn comparison_key_drops_punctuation_and_case() {
    assert_eq!(comparison_key("Tabby.Tales_99"), "tabbytales99");
    assert_eq!(comparison_key("..."), "");
}

#[test]
fn resolve_prefers_exact_then_loose_matches() {
    let policy = MatchPolicy::default();
    let candidates = ["tabby.tales", "Tabby_Tales", "corgi_club"];

    assert_eq!(policy.resolve("Tabby_Tales", candidates), Some("Tabby_Tales"));
    assert_eq!(policy.resolve("TABBY.TALES", candidates), Some("tabby.tales"));
    assert_eq!(policy.resolve("corgiclub", candidates), Some("corgi_club"));
    assert_eq!(policy.resolve("corgi_club_official", candidates), Some("corgi_club"));
    assert_eq!(policy.resolve("golden_hour", candidates), None);
}

#[test]
fn containment_respects_policy() {
    let candidates = ["corgi_club", "max"];
    assert_eq!(
        MatchPolicy::exact_only().resolve("corgi_club_official", candidates),
        None
    );
    // "max" is shorter than the minimum containment length.
    assert_eq!(MatchPolicy::default().resolve("maxthepug", candidates), None);
}

proptest! {
    #[test]
    fn normalize_is_idempotent(raw in ".{0,40}") {
        let normalizer = IdentityNormalizer::default();
        let once = normalizer.normalize(&raw);
        prop_assert_eq!(normalizer.normalize(&once), once);
    }

    #[test]
    fn normalize_is_idempotent_for_handles(raw in "[ @]{0,3}[A-Za-z0-9._ ]{0,20}(/[A-Za-z0-9._ @]{0,10})?") {
        let normalizer = IdentityNormalizer::default();
        let once = normalizer.normalize(&raw);
        prop_assert_eq!(normalizer.normalize(&once), once);
    }
}
