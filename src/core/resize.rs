use image::{ImageBuffer, Pixel};

/// Resize by pixel-area coverage.
///
/// Every destination pixel is the coverage-weighted mean of the source
/// pixels its footprint overlaps, so solid regions stay exactly solid and
/// downscaling does not alias.
pub fn resize_area<P>(
    image: &ImageBuffer<P, Vec<u8>>,
    new_width: u32,
    new_height: u32,
) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8>,
{
    let (width, height) = image.dimensions();
    if (width, height) == (new_width, new_height) {
        return image.clone();
    }

    let mut output = ImageBuffer::<P, Vec<u8>>::new(new_width, new_height);
    if width == 0 || height == 0 || new_width == 0 || new_height == 0 {
        return output;
    }

    let channels = usize::from(P::CHANNEL_COUNT);
    let columns = coverage(width, new_width);
    let rows = coverage(height, new_height);
    let src: &[u8] = image.as_raw();
    let src_stride = width as usize * channels;
    let dst: &mut [u8] = &mut output;
    let dst_stride = new_width as usize * channels;

    let mut acc = vec![0.0f32; channels];
    for (dy, row_weights) in rows.iter().enumerate() {
        for (dx, col_weights) in columns.iter().enumerate() {
            acc.fill(0.0);
            for &(sy, wy) in row_weights {
                let row = sy * src_stride;
                for &(sx, wx) in col_weights {
                    let weight = wy * wx;
                    let base = row + sx * channels;
                    for (c, value) in acc.iter_mut().enumerate() {
                        *value += src[base + c] as f32 * weight;
                    }
                }
            }

            let base = dy * dst_stride + dx * channels;
            for (c, value) in acc.iter().enumerate() {
                dst[base + c] = value.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    output
}

/// For each destination index, the source indices it overlaps and the share
/// of the destination footprint each one covers. Shares sum to 1.
fn coverage(src_len: u32, dst_len: u32) -> Vec<Vec<(usize, f32)>> {
    let scale = src_len as f64 / dst_len as f64;
    (0..dst_len)
        .map(|i| {
            let start = i as f64 * scale;
            let end = start + scale;
            let first = start.floor() as usize;
            let last = (end.ceil() as usize).min(src_len as usize);
            (first..last)
                .filter_map(|j| {
                    let overlap = end.min(j as f64 + 1.0) - start.max(j as f64);
                    (overlap > 0.0).then(|| (j, (overlap / scale) as f32))
                })
                .collect()
        })
        .collect()
}
