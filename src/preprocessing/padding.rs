use ndarray::Array4;

/// Amount needed to grow `dim` to the next multiple of `multiple`.
pub fn pad_amount(dim: usize, multiple: usize) -> usize {
    if multiple <= 1 {
        return 0;
    }
    (multiple - dim % multiple) % multiple
}

/// Index into a dimension of length `len` under mirror reflection that
/// excludes the edge sample, e.g. `len = 3`: 0 1 2 1 0 1 2 ...
fn reflect_index(i: usize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    let r = i % period;
    if r < len {
        r
    } else {
        period - r
    }
}

/// Reflect-pads the bottom and right edges of a `[N, C, H, W]` tensor so
/// both spatial dims become multiples of `multiple`.
pub fn pad_to_multiple(input: &Array4<f32>, multiple: usize) -> Array4<f32> {
    let (n, c, h, w) = input.dim();
    let pad_h = pad_amount(h, multiple);
    let pad_w = pad_amount(w, multiple);
    if pad_h == 0 && pad_w == 0 {
        return input.clone();
    }

    Array4::from_shape_fn((n, c, h + pad_h, w + pad_w), |(b, ch, y, x)| {
        input[[b, ch, reflect_index(y, h), reflect_index(x, w)]]
    })
}
