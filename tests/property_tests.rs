//! Property-based tests for the encoders

use proptest::prelude::*;
use tensor_fixtures::format::{align_to, calculate_padding, is_aligned};
use tensor_fixtures::gguf::{self, GGUFFile, Metadata, TensorDescriptor, TensorPayload};
use tensor_fixtures::safetensors::{self, Dtype, SafetensorsFile, SafetensorsTensorEntry};

fn dtype_strategy() -> impl Strategy<Value = Dtype> {
    prop_oneof![
        Just(Dtype::BOOL),
        Just(Dtype::U8),
        Just(Dtype::F16),
        Just(Dtype::BF16),
        Just(Dtype::F32),
        Just(Dtype::I64),
    ]
}

fn safetensors_strategy() -> impl Strategy<Value = SafetensorsFile> {
    prop::collection::vec((dtype_strategy(), prop::collection::vec(1u64..16, 1..4)), 0..6).prop_map(
        |tensors| {
            let mut cursor = 0;
            let entries = tensors
                .into_iter()
                .enumerate()
                .map(|(i, (dtype, shape))| {
                    let name = format!("layer.{}.weight", i);
                    let entry = SafetensorsTensorEntry::packed(name, dtype, shape, cursor).unwrap();
                    cursor = entry.data_offsets.1;
                    entry
                })
                .collect();
            SafetensorsFile::new(entries).unwrap()
        },
    )
}

fn gguf_strategy() -> impl Strategy<Value = GGUFFile> {
    (
        prop::collection::vec(("[a-z]{1,12}(\\.[a-z]{1,8})?", any::<u32>()), 0..6),
        prop::collection::vec(prop::collection::vec(1u64..64, 1..4), 0..4),
    )
        .prop_map(|(entries, shapes)| {
            let mut metadata = Metadata::new();
            for (key, value) in entries {
                metadata.insert(key, value);
            }
            let mut cursor = 0u64;
            let tensors = shapes
                .into_iter()
                .enumerate()
                .map(|(i, shape)| {
                    let tensor = TensorDescriptor::new(format!("t{}", i), 0, shape, cursor);
                    cursor = align_to(cursor + tensor.element_count() * 4, 32);
                    tensor
                })
                .collect();
            GGUFFile::new(metadata, tensors).unwrap()
        })
}

proptest! {
    #[test]
    fn test_padding_properties(value in 0u64..100_000, alignment_power in 0u32..10) {
        let alignment = 1u64 << alignment_power;
        let padding = calculate_padding(value, alignment);

        prop_assert!(padding < alignment);
        prop_assert!(is_aligned(value + padding, alignment));
        prop_assert_eq!(align_to(value, alignment), value + padding);
    }

    #[test]
    fn test_safetensors_size_law(file in safetensors_strategy()) {
        let bytes = safetensors::encode(&file).unwrap();
        let header_len = u64::from_le_bytes(bytes[..8].try_into().unwrap());
        let padding = (8 - header_len % 8) % 8;

        prop_assert_eq!(bytes.len() as u64, 8 + header_len + padding + file.data_len());
        prop_assert_eq!(bytes.len() as u64, file.encoded_len().unwrap());
        prop_assert!(bytes[(8 + header_len) as usize..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_safetensors_header_round_trips(file in safetensors_strategy()) {
        let bytes = safetensors::encode(&file).unwrap();
        let header_len = u64::from_le_bytes(bytes[..8].try_into().unwrap()) as usize;
        let header: serde_json::Value = serde_json::from_slice(&bytes[8..8 + header_len]).unwrap();
        let object = header.as_object().unwrap();

        prop_assert_eq!(object.len(), file.tensors().len());
        for tensor in file.tensors() {
            let entry = &header[tensor.name.as_str()];
            prop_assert_eq!(entry["dtype"].as_str().unwrap(), tensor.dtype.name());
            prop_assert_eq!(entry["data_offsets"][0].as_u64().unwrap(), tensor.data_offsets.0);
            prop_assert_eq!(entry["data_offsets"][1].as_u64().unwrap(), tensor.data_offsets.1);
        }
    }

    #[test]
    fn test_gguf_deterministic_and_sized(file in gguf_strategy()) {
        let first = gguf::encode(&file).unwrap();
        prop_assert_eq!(&first, &gguf::encode(&file).unwrap());
        prop_assert_eq!(first.len() as u64, file.encoded_len().unwrap());
        let tensor_count = u64::from_le_bytes(first[8..16].try_into().unwrap());
        let kv_count = u64::from_le_bytes(first[16..24].try_into().unwrap());
        prop_assert_eq!(tensor_count, file.tensors().len() as u64);
        prop_assert_eq!(kv_count, file.metadata().len() as u64);
    }

    #[test]
    fn test_gguf_aligned_data_is_zero(file in gguf_strategy()) {
        let file = file.with_payload(TensorPayload::aligned_default()).unwrap();
        let bytes = gguf::encode(&file).unwrap();
        let start = file.data_section_start().unwrap();

        prop_assert_eq!(start % 32, 0);
        prop_assert_eq!(bytes.len() as u64, start + file.data_section_len().unwrap());
        prop_assert!(bytes[file.descriptors_len() as usize..].iter().all(|&b| b == 0));
    }
}
