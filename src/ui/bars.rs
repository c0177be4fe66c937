const GLYPHS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// One display level per band: sqrt of the band's mean magnitude.
pub fn band_levels(bands: &[Vec<f32>]) -> Vec<f32> {
    bands
        .iter()
        .map(|band| {
            if band.is_empty() {
                return 0.0;
            }
            let mean = band.iter().sum::<f32>() / band.len() as f32;
            mean.max(0.0).sqrt()
        })
        .collect()
}

/// Map levels in [0, 1] onto a row of block glyphs.
pub fn render_bars(levels: &[f32]) -> String {
    levels
        .iter()
        .map(|&level| {
            let clamped = level.clamp(0.0, 1.0);
            let index = (clamped * (GLYPHS.len() - 1) as f32).round() as usize;
            GLYPHS[index]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_sqrt_of_band_means() {
        let bands = vec![vec![0.25, 0.25], vec![1.0], vec![]];
        let levels = band_levels(&bands);

        assert_eq!(levels.len(), 3);
        assert!((levels[0] - 0.5).abs() < 1e-6);
        assert!((levels[1] - 1.0).abs() < 1e-6);
        assert_eq!(levels[2], 0.0);
    }

    #[test]
    fn silence_renders_the_lowest_glyph() {
        assert_eq!(render_bars(&[0.0, 0.0, 0.0]), "▁▁▁");
    }

    #[test]
    fn full_scale_renders_the_tallest_glyph() {
        assert_eq!(render_bars(&[1.0]), "█");
    }

    #[test]
    fn out_of_range_levels_are_clamped() {
        assert_eq!(render_bars(&[-0.5, 2.0]), "▁█");
    }
}
