use ndarray::ArrayView3;

/// One decoded picture handed to a detector: packed RGB bytes, row-major.
///
/// `index` is the decode-order position within its source, starting at 0.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    index: usize,
}

impl Frame {
    pub const CHANNELS: usize = 3;

    pub fn new(data: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * Self::CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// `[height, width, channel]` view over the pixel bytes.
    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        let shape = (self.height as usize, self.width as usize, Self::CHANNELS);
        ArrayView3::from_shape(shape, &self.data).expect("Frame data length must match dimensions")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let frame = Frame::new(vec![7u8; 2 * 3 * 3], 3, 2, 4);
        assert_eq!(frame.width(), 3);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.index(), 4);
        assert_eq!(frame.data().len(), 18);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * 3")]
    fn test_wrong_length_panics_in_debug() {
        Frame::new(vec![0u8; 5], 2, 2, 0);
    }

    #[test]
    fn test_ndarray_is_height_major() {
        // 2 wide, 1 tall: second pixel is green
        let frame = Frame::new(vec![0, 0, 0, 0, 255, 0], 2, 1, 0);
        let view = frame.as_ndarray();
        assert_eq!(view.shape(), &[1, 2, 3]);
        assert_eq!(view[[0, 1, 1]], 255);
        assert_eq!(view[[0, 0, 1]], 0);
    }
}
