//! Data alignment utilities shared by the GGUF data section and the safetensors header

/// Calculate the padding needed to align to the specified boundary
pub fn calculate_padding(current_position: u64, alignment: u64) -> u64 {
    if alignment == 0 || alignment == 1 {
        return 0;
    }

    let remainder = current_position % alignment;
    if remainder == 0 {
        0
    } else {
        alignment - remainder
    }
}

/// Align a position to the specified boundary
pub fn align_to(position: u64, alignment: u64) -> u64 {
    position + calculate_padding(position, alignment)
}

/// Check if a position is aligned to the specified boundary
pub fn is_aligned(position: u64, alignment: u64) -> bool {
    if alignment == 0 || alignment == 1 {
        return true;
    }
    position % alignment == 0
}

/// Check if an alignment value is valid (power of 2)
pub fn is_valid_alignment(alignment: u64) -> bool {
    alignment > 0 && (alignment & (alignment - 1)) == 0
}

/// Padding required at a given stream position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignmentInfo {
    /// Current position in the output stream
    pub position: u64,
    /// Required alignment boundary
    pub alignment: u64,
    /// Number of zero bytes to emit
    pub padding: u64,
    /// Position after padding
    pub aligned_position: u64,
}

impl AlignmentInfo {
    /// Create alignment information for a given position and alignment
    pub fn new(position: u64, alignment: u64) -> Self {
        let padding = calculate_padding(position, alignment);
        Self { position, alignment, padding, aligned_position: position + padding }
    }

    /// Check if padding is needed
    pub fn needs_padding(&self) -> bool {
        self.padding > 0
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_padding() {
        assert_eq!(calculate_padding(0, 32), 0);
        assert_eq!(calculate_padding(1, 32), 31);
        assert_eq!(calculate_padding(16, 32), 16);
        assert_eq!(calculate_padding(32, 32), 0);
        assert_eq!(calculate_padding(33, 32), 31);

        // Edge cases
        assert_eq!(calculate_padding(10, 1), 0);
        assert_eq!(calculate_padding(10, 0), 0);
    }

    #[test]
    fn test_safetensors_header_padding() {
        // (8 - len % 8) % 8
        for len in 0u64..64 {
            assert_eq!(calculate_padding(len, 8), (8 - len % 8) % 8);
        }
        assert_eq!(calculate_padding(75, 8), 5);
    }

    #[test]
    fn test_align_to() {
        assert_eq!(align_to(0, 32), 0);
        assert_eq!(align_to(1, 32), 32);
        assert_eq!(align_to(32, 32), 32);
        assert_eq!(align_to(33, 32), 64);
    }

    #[test]
    fn test_is_aligned() {
        assert!(is_aligned(0, 32));
        assert!(is_aligned(64, 32));
        assert!(!is_aligned(33, 32));
        assert!(is_aligned(42, 1));
        assert!(is_aligned(42, 0));
    }

    #[test]
    fn test_is_valid_alignment() {
        for alignment in [1, 2, 4, 8, 16, 32, 4096] {
            assert!(is_valid_alignment(alignment));
        }
        for alignment in [0, 3, 5, 12, 48] {
            assert!(!is_valid_alignment(alignment));
        }
    }

    #[test]
    fn test_alignment_info() {
        let info = AlignmentInfo::new(17, 32);
        assert_eq!(info.padding, 15);
        assert_eq!(info.aligned_position, 32);
        assert!(info.needs_padding());

        let info_aligned = AlignmentInfo::new(32, 32);
        assert_eq!(info_aligned.padding, 0);
        assert!(!info_aligned.needs_padding());
    }
}
