//! Word list for human-readable pairing codes.
//!
//! Exactly 64 entries so a 16-bit chunk maps onto the list without
//! modulo bias. Lowercase and free of separators.

pub(crate) const WORD_LIST: [&str; 64] = [
    "amber", "apex", "arch", "atlas", "aurora", "axiom", "beacon", "binary",
    "blaze", "cinder", "cipher", "cobalt", "comet", "crux", "delta", "drift",
    "eclipse", "ember", "falcon", "flux", "forge", "gamma", "glint", "halo",
    "helios", "inferno", "ionic", "jade", "jolt", "kepler", "krypton", "lambda",
    "lattice", "lumen", "matrix", "meteor", "nebula", "nova", "onyx", "oracle",
    "orbit", "phoenix", "pulsar", "quantum", "quartz", "quasar", "raven", "relay",
    "rune", "sable", "sigma", "sol", "spire", "tango", "titan", "umbra",
    "valor", "vega", "vertex", "vortex", "warden", "xenon", "zenith", "zephyr",
];

#[cfg(test)]
mod tests {
    use super::WORD_LIST;
    use std::collections::HashSet;

    #[test]
    fn words_are_unique_lowercase_and_dash_free() {
        let unique: HashSet<_> = WORD_LIST.iter().collect();
        assert_eq!(unique.len(), WORD_LIST.len());
        for word in WORD_LIST {
            assert!(word.chars().all(|c| c.is_ascii_lowercase()), "{word}");
        }
    }
}
