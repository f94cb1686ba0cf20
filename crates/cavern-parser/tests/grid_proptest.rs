//! Property tests: grid round-tripping and pipeline robustness.

use proptest::prelude::*;

use cavern_core::grid::Grid;
use cavern_parser::{ValidateOptions, analyze, parse};

fn arb_grid() -> impl Strategy<Value = Grid> {
    (1usize..12, 1usize..12)
        .prop_flat_map(|(width, height)| {
            proptest::collection::vec(0u32..200, width * height)
                .prop_map(move |cells| Grid::from_cells(width, height, cells).unwrap())
        })
}

proptest! {
    /// Serializing a grid and parsing it back is the identity.
    #[test]
    fn grid_round_trips(grid in arb_grid()) {
        let source = format!("tiles{{\n{}}}\n", grid.serialize());
        let outcome = parse(&source);
        prop_assert!(outcome.diagnostics.is_empty());
        let parsed = outcome
            .document
            .grid(cavern_core::document::SectionKind::Tiles)
            .expect("tiles section parses");
        prop_assert_eq!(parsed, &grid);
    }

    /// The pipeline accepts arbitrary text without panicking and always
    /// produces a document.
    #[test]
    fn analyze_never_panics(source in "\\PC{0,400}") {
        let outcome = analyze(&source, &ValidateOptions::default());
        let _ = outcome.document.sections();
    }

    /// Structured junk: section-shaped fragments with arbitrary bodies.
    #[test]
    fn sectioned_junk_never_panics(
        name in "[a-z]{1,10}",
        body in "[ -~\\n]{0,200}",
    ) {
        let source = format!("{name}{{\n{body}\n}}\n");
        let outcome = analyze(&source, &ValidateOptions::default());
        let _ = outcome.document.sections();
    }
}
