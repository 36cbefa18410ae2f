use rayon::prelude::*;

use crate::grid::Grid;

/// 8-bit grayscale preview of a normalized heightmap.
pub fn render_heightmap(height: &Grid<f32>) -> Vec<u8> {
    let w = height.w;
    let mut gray = vec![0u8; w * height.h];
    gray.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        for (x, px) in row.iter_mut().enumerate() {
            *px = (height.get(x, y).clamp(0.0, 1.0) * 255.0).round() as u8;
        }
    });
    gray
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_unit_range_to_bytes() {
        let g = Grid::from_vec(2, vec![0.0, 0.5, 1.0, 2.0]).unwrap();
        assert_eq!(render_heightmap(&g), vec![0, 128, 255, 255]);
    }
}
