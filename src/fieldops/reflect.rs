use ndarray::Array2;

/// Pad a field to a `size` × `size` square, centered, filling the borders
/// by reflection. The border row/column itself is not repeated (the
/// mirror axis sits on the edge sample).
///
/// Both input dimensions must already be ≤ `size`.
pub fn pad_to_square(field: &Array2<f32>, size: u32) -> Array2<f32> {
    let (h, w) = field.dim();
    let size = size as usize;
    debug_assert!(h <= size && w <= size);

    if h == size && w == size {
        return field.clone();
    }

    let pad_top = (size - h) / 2;
    let pad_left = (size - w) / 2;

    Array2::from_shape_fn((size, size), |(y, x)| {
        let src_y = mirror(y as i64 - pad_top as i64, h as i64);
        let src_x = mirror(x as i64 - pad_left as i64, w as i64);
        field[(src_y as usize, src_x as usize)]
    })
}

/// Map an out-of-range index back into `0..len` by reflecting around the
/// edge samples: -1 → 1, len → len - 2.
fn mirror(i: i64, len: i64) -> i64 {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    let wrapped = i.rem_euclid(period);
    if wrapped >= len {
        period - wrapped
    } else {
        wrapped
    }
}
