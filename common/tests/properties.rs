//! Property tests for the pixel model.

use panelforge_common::{ActivePanels, FrameSequence, PanelGrid, Pixel, Wall};
use proptest::prelude::*;

fn pixel_strategy() -> impl Strategy<Value = Pixel> {
    any::<[u8; 3]>().prop_map(Pixel::from)
}

fn panel_strategy() -> impl Strategy<Value = PanelGrid> {
    (1usize..12, 1usize..12).prop_flat_map(|(cols, rows)| {
        prop::collection::vec(pixel_strategy(), cols * rows).prop_map(move |pixels| {
            let mut grid = PanelGrid::new(cols, rows);
            for (idx, pixel) in pixels.into_iter().enumerate() {
                grid.set(idx % cols, idx / cols, pixel);
            }
            grid
        })
    })
}

proptest! {
    #[test]
    fn hex_round_trips(hex in "#?[0-9a-fA-F]{6}") {
        let normalized = format!("#{}", hex.trim_start_matches('#').to_ascii_lowercase());
        prop_assert_eq!(Pixel::from_hex(&hex).to_hex(), normalized);
    }

    #[test]
    fn invalid_hex_is_red(hex in "[^0-9a-fA-F#]{0,8}|#?[0-9a-fA-F]{0,5}|#?[0-9a-fA-F]{7,9}") {
        prop_assert_eq!(Pixel::from_hex(&hex), Pixel::new(255, 0, 0));
    }

    #[test]
    fn resize_preserves_overlap(panel in panel_strategy(), cols in 1usize..16, rows in 1usize..16) {
        let resized = panel.resized(cols, rows);
        prop_assert_eq!((resized.cols(), resized.rows()), (cols, rows));

        for (x, y, pixel) in resized.pixels() {
            let expected = if x < panel.cols() && y < panel.rows() {
                panel.get(x, y).unwrap()
            } else {
                Pixel::BLACK
            };
            prop_assert_eq!(pixel, expected);
        }
    }

    #[test]
    fn cloned_walls_are_independent(
        x in 0i32..8,
        y in 0i32..8,
        panel in 0usize..4,
        pixel in pixel_strategy(),
    ) {
        let original = Wall::new(8, 8);
        let mut copy = original.clone();
        copy.panel_mut(panel).unwrap().set(x as usize, y as usize, pixel);
        copy.set_pixel(x, y, pixel, ActivePanels::new(4));

        prop_assert_eq!(&original, &Wall::new(8, 8));
    }

    #[test]
    fn sequence_never_empties(ops in prop::collection::vec(0u8..4, 0..40)) {
        let mut seq = FrameSequence::new(Wall::new(2, 2));
        for op in ops {
            match op {
                0 => { seq.delete_current(); }
                1 => seq.insert_after_current(None),
                2 => { seq.goto_prev(); }
                _ => seq.duplicate_current(),
            }
            prop_assert!(seq.len() >= 1);
            prop_assert!(seq.current_index() < seq.len());
        }
    }
}
