use tf_core::charset::Ramp;
use tf_core::error::CoreError;
use tf_core::frame::{AsciiFrame, LuminanceGrid};

/// Mappe une grille de luminances vers du texte.
///
/// Pour chaque valeur `v` : `index = floor((v / 255) * (n - 1))`, borné,
/// puis `ramp[index]` (ou `ramp[n - 1 - index]` sous `invert`). Une ligne
/// par rangée de la grille, chacune terminée par `'\n'`.
///
/// # Errors
/// Returns `CoreError::InvalidRamp` if `ramp` is empty.
///
/// # Example
/// ```
/// use tf_ascii::mapper::map_to_ascii;
/// use tf_core::frame::LuminanceGrid;
///
/// let grid = LuminanceGrid::from_values(3, 1, vec![0.0, 127.5, 255.0]).unwrap();
/// let frame = map_to_ascii(&grid, "@%#*+=-:. ", false).unwrap();
/// assert_eq!(frame.as_str(), "@+ \n");
/// ```
pub fn map_to_ascii(
    grid: &LuminanceGrid,
    ramp: &str,
    invert: bool,
) -> Result<AsciiFrame, CoreError> {
    let ramp = Ramp::new(ramp)?;
    Ok(map_with_ramp(grid, &ramp, invert))
}

/// Variante sans validation, la rampe étant déjà construite.
#[must_use]
pub fn map_with_ramp(grid: &LuminanceGrid, ramp: &Ramp, invert: bool) -> AsciiFrame {
    let mut frame = AsciiFrame::with_width(grid.width());
    for row in grid.rows() {
        frame.push_line(row.iter().map(|&v| ramp.char_for(v, invert)));
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use tf_core::charset::DEFAULT_RAMP;

    fn sweep() -> LuminanceGrid {
        let values: Vec<f64> = (0..=765).map(|s| f64::from(s) / 3.0).collect();
        LuminanceGrid::from_values(766, 1, values).unwrap()
    }

    #[test]
    fn empty_ramp_is_invalid() {
        let grid = LuminanceGrid::uniform(2, 2, 10.0);
        assert_eq!(map_to_ascii(&grid, "", false), Err(CoreError::InvalidRamp));
    }

    #[test]
    fn boundary_values() {
        let grid = LuminanceGrid::from_values(2, 1, vec![0.0, 255.0]).unwrap();
        let frame = map_to_ascii(&grid, DEFAULT_RAMP, false).unwrap();
        assert_eq!(frame.as_str(), "@ \n");
    }

    #[test]
    fn inversion_is_ramp_reversal() {
        let grid = sweep();
        let reversed: String = DEFAULT_RAMP.chars().rev().collect();
        let inverted = map_to_ascii(&grid, DEFAULT_RAMP, true).unwrap();
        let mirrored = map_to_ascii(&grid, &reversed, false).unwrap();
        assert_eq!(inverted, mirrored);

        let ramp = Ramp::new("█▓▒░ ").unwrap();
        assert_eq!(
            map_with_ramp(&grid, &ramp, true),
            map_with_ramp(&grid, &ramp.reversed(), false)
        );
    }

    #[test]
    fn monotonic_over_uniform_grids() {
        let ramp = Ramp::default();
        let index_of = |v: f64| {
            let frame = map_with_ramp(&LuminanceGrid::uniform(3, 2, v), &ramp, false);
            let ch = frame.as_str().chars().next().unwrap();
            ramp.chars().iter().position(|&c| c == ch).unwrap()
        };
        let mut prev = 0;
        for step in 0..=510 {
            let idx = index_of(f64::from(step) / 2.0);
            assert!(idx >= prev, "non monotone à {}", f64::from(step) / 2.0);
            prev = idx;
        }
    }

    #[test]
    fn one_line_per_row() {
        let grid = LuminanceGrid::uniform(7, 4, 200.0);
        let frame = map_to_ascii(&grid, DEFAULT_RAMP, false).unwrap();
        assert_eq!(frame.height(), 4);
        assert_eq!(frame.as_str(), ":::::::\n".repeat(4));
    }

    #[test]
    fn empty_grid_gives_empty_frame() {
        let frame = map_to_ascii(&LuminanceGrid::new(10, 0), DEFAULT_RAMP, false).unwrap();
        assert_eq!(frame.as_str(), "");
        assert_eq!(frame.height(), 0);
    }

    #[test]
    fn fractional_thirds_match_floor_formula() {
        // 85.333… (somme 256) → 85.333/255*9 = 3.01 → '*'.
        let grid = LuminanceGrid::from_values(2, 1, vec![256.0 / 3.0, 254.0 / 3.0]).unwrap();
        let frame = map_to_ascii(&grid, DEFAULT_RAMP, false).unwrap();
        assert_eq!(frame.as_str(), "*#\n");
    }
}
