use serde_json::{Map, Value};

use crate::decode::decode_error::{DatagramError, SubjectDecodeError};
use crate::decode::head_orientation::HeadOrientation;
use crate::skeleton::{AnimationFrameData, SkeletonStaticData, SubjectUpdate, Transform, HEAD_PITCH, HEAD_ROLL, HEAD_YAW};

const BONE: &str = "Bone";
const PARAMETER: &str = "Parameter";
const NAME: &str = "Name";
const PARENT: &str = "Parent";
const LOCATION: &str = "Location";
const ROTATION: &str = "Rotation";
const SCALE: &str = "Scale";
const VALUE: &str = "Value";

/// The outcome for one top level key of a datagram, in the order the keys appear in the datagram
pub type SubjectDecodeResult = (String, Result<SubjectUpdate, SubjectDecodeError>);

/// Decodes a datagram's payload, i.e. a JSON object that maps subject names to their updates.
///
/// Subjects are decoded independently of each other: A defect in one subject's update discards
///  only that subject, and it is reported in the subject's slot of the result. Only a payload that
///  is not a JSON object as a whole is rejected entirely.
pub fn decode_datagram(datagram: &[u8]) -> Result<Vec<SubjectDecodeResult>, DatagramError> {
    let text = std::str::from_utf8(datagram)?;
    let json: Value = serde_json::from_str(text)?;
    let Value::Object(subjects) = json else {
        return Err(DatagramError::NotAnObject);
    };

    Ok(subjects.iter()
        .map(|(subject_name, subject)| (subject_name.clone(), decode_subject(subject_name, subject)))
        .collect())
}

/// Decodes a single subject's update. This is all-or-nothing: either all bones and parameters are
///  well-formed, or the first defect is returned and nothing of the subject is used.
///
/// Both `"Bone"` and `"Parameter"` are optional, and a value that is not an array counts as absent.
///  If parameters are present, they are followed by three derived head orientation properties
///  which are computed from the rotation of the *last* bone in the update.
pub fn decode_subject(subject_name: &str, subject: &Value) -> Result<SubjectUpdate, SubjectDecodeError> {
    let subject = subject.as_object()
        .ok_or(SubjectDecodeError::NotAnObject)?;

    let mut static_data = SkeletonStaticData::default();
    let mut frame_data = AnimationFrameData::default();
    let mut head_orientation = HeadOrientation::default();

    if let Some(bones) = subject.get(BONE).and_then(Value::as_array) {
        let bones = entry_objects(bones, BONE)?;

        static_data.bone_names.reserve_exact(bones.len());
        static_data.bone_parents.reserve_exact(bones.len());
        for (index, bone) in bones.iter().enumerate() {
            static_data.bone_names.push(string_field(bone, BONE, index, NAME)?);
            static_data.bone_parents.push(parent_field(bone, index)?);
        }

        frame_data.transforms.reserve_exact(bones.len());
        for (index, bone) in bones.iter().enumerate() {
            let translation = vector_field::<3>(bone, index, LOCATION)?;
            let rotation = vector_field::<4>(bone, index, ROTATION)?;
            let scale = vector_field::<3>(bone, index, SCALE)?;

            head_orientation = HeadOrientation::from_quaternion(rotation);
            frame_data.transforms.push(Transform { translation, rotation, scale });
        }
    }

    if let Some(parameters) = subject.get(PARAMETER).and_then(Value::as_array) {
        let parameters = entry_objects(parameters, PARAMETER)?;

        static_data.property_names.reserve_exact(parameters.len() + 3);
        frame_data.property_values.reserve_exact(parameters.len() + 3);
        for (index, parameter) in parameters.iter().enumerate() {
            static_data.property_names.push(string_field(parameter, PARAMETER, index, NAME)?);
        }
        for (index, parameter) in parameters.iter().enumerate() {
            let value = parameter.get(VALUE)
                .and_then(Value::as_f64)
                .ok_or(SubjectDecodeError::InvalidField { section: PARAMETER, index, field: VALUE })?;
            frame_data.property_values.push(value as f32);
        }

        static_data.property_names.extend([HEAD_ROLL, HEAD_PITCH, HEAD_YAW].map(String::from));
        frame_data.property_values.extend([
            head_orientation.roll as f32,
            head_orientation.pitch as f32,
            head_orientation.yaw as f32,
        ]);
    }

    Ok(SubjectUpdate {
        subject_name: subject_name.to_string(),
        static_data,
        frame_data,
    })
}

fn entry_objects<'a>(entries: &'a [Value], section: &'static str) -> Result<Vec<&'a Map<String, Value>>, SubjectDecodeError> {
    entries.iter()
        .enumerate()
        .map(|(index, entry)| entry.as_object()
            .ok_or(SubjectDecodeError::EntryNotAnObject { section, index }))
        .collect()
}

fn string_field(entry: &Map<String, Value>, section: &'static str, index: usize, field: &'static str) -> Result<String, SubjectDecodeError> {
    entry.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(SubjectDecodeError::InvalidField { section, index, field })
}

/// JSON does not distinguish integers from floats, so whole-number floats like `-1.0` are
///  accepted as parent indices. Out-of-range floats saturate and are then rejected by the range check.
fn parent_field(bone: &Map<String, Value>, index: usize) -> Result<i32, SubjectDecodeError> {
    let parent = bone.get(PARENT)
        .and_then(|parent| match parent.as_i64() {
            Some(parent) => Some(parent),
            None => parent.as_f64()
                .filter(|parent| parent.fract() == 0.0)
                .map(|parent| parent as i64),
        });

    parent
        .and_then(|parent| i32::try_from(parent).ok())
        .ok_or(SubjectDecodeError::InvalidField { section: BONE, index, field: PARENT })
}

fn vector_field<const N: usize>(bone: &Map<String, Value>, index: usize, field: &'static str) -> Result<[f64; N], SubjectDecodeError> {
    let err = SubjectDecodeError::InvalidVector { section: BONE, index, field, expected: N };

    let elements = bone.get(field)
        .and_then(Value::as_array)
        .filter(|elements| elements.len() == N)
        .ok_or(err.clone())?;

    let mut result = [0.0; N];
    for (r, element) in result.iter_mut().zip(elements) {
        *r = element.as_f64().ok_or(err.clone())?;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2};
    use serde_json::json;
    use crate::skeleton::NO_PARENT;

    fn bone(name: &str, parent: i32, rotation: [f64; 4]) -> Value {
        json!({"Name": name, "Parent": parent, "Location": [1.0, 2.0, 3.0], "Rotation": rotation, "Scale": [1.0, 1.0, 1.0]})
    }

    fn decode_single(datagram: &str) -> Result<SubjectUpdate, SubjectDecodeError> {
        let mut decoded = decode_datagram(datagram.as_bytes()).unwrap();
        assert_eq!(decoded.len(), 1);
        decoded.remove(0).1
    }

    #[test]
    fn test_single_bone_with_parameter() {
        let datagram = r#"{"Head":{"Bone":[{"Name":"root","Parent":-1,"Location":[0,0,0],"Rotation":[0,0,0,1],"Scale":[1,1,1]}],"Parameter":[{"Name":"blink","Value":0.5}]}}"#;
        let decoded = decode_datagram(datagram.as_bytes()).unwrap();

        assert_eq!(decoded, vec![("Head".to_string(), Ok(SubjectUpdate {
            subject_name: "Head".to_string(),
            static_data: SkeletonStaticData {
                bone_names: vec!["root".to_string()],
                bone_parents: vec![NO_PARENT],
                property_names: vec!["blink".to_string(), "headRoll".to_string(), "headPitch".to_string(), "headYaw".to_string()],
            },
            frame_data: AnimationFrameData {
                transforms: vec![Transform {
                    translation: [0.0, 0.0, 0.0],
                    rotation: [0.0, 0.0, 0.0, 1.0],
                    scale: [1.0, 1.0, 1.0],
                }],
                property_values: vec![0.5, 0.0, 0.0, 0.0],
            },
        }))]);
    }

    #[rstest]
    #[case::no_bones_no_parameters(0, 0)]
    #[case::bones_only(3, 0)]
    #[case::parameters_only(0, 4)]
    #[case::both(5, 2)]
    #[case::many(50, 60)]
    fn test_lengths(#[case] num_bones: usize, #[case] num_parameters: usize) {
        let mut subject = Map::new();
        if num_bones > 0 {
            subject.insert(BONE.to_string(), (0..num_bones)
                .map(|i| bone(&format!("b{}", i), i as i32 - 1, [0.0, 0.0, 0.0, 1.0]))
                .collect());
        }
        if num_parameters > 0 {
            subject.insert(PARAMETER.to_string(), (0..num_parameters)
                .map(|i| json!({"Name": format!("p{}", i), "Value": i}))
                .collect());
        }

        let update = decode_subject("s", &Value::Object(subject)).unwrap();

        assert_eq!(update.static_data.bone_names.len(), num_bones);
        assert_eq!(update.static_data.bone_parents.len(), num_bones);
        assert_eq!(update.frame_data.transforms.len(), num_bones);

        let expected_num_properties = if num_parameters > 0 { num_parameters + 3 } else { 0 };
        assert_eq!(update.static_data.property_names.len(), expected_num_properties);
        assert_eq!(update.frame_data.property_values.len(), expected_num_properties);
        if num_parameters > 0 {
            assert_eq!(&update.static_data.property_names[num_parameters..], &["headRoll", "headPitch", "headYaw"]);
            assert_eq!(update.static_data.property_names[0], "p0");
            assert_eq!(update.frame_data.property_values[num_parameters - 1], (num_parameters - 1) as f32);
        }
    }

    #[test]
    fn test_empty_parameter_array_still_carries_head_orientation() {
        let update = decode_single(r#"{"s":{"Parameter":[]}}"#).unwrap();
        assert_eq!(update.static_data.property_names, vec!["headRoll", "headPitch", "headYaw"]);
        assert_eq!(update.frame_data.property_values, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_head_orientation_from_last_bone() {
        let quarter_turn_z = [0.0, 0.0, FRAC_1_SQRT_2, FRAC_1_SQRT_2];
        let quarter_turn_x = [FRAC_1_SQRT_2, 0.0, 0.0, FRAC_1_SQRT_2];

        let subject = json!({
            "Bone": [
                bone("root", -1, quarter_turn_x),
                bone("neck", 0, quarter_turn_x),
                bone("head", 1, [0.0, 0.0, 0.0, 1.0]),
                bone("jaw", 2, quarter_turn_z),
            ],
            "Parameter": [{"Name": "blink", "Value": 1.0}],
        });

        let update = decode_subject("s", &subject).unwrap();
        let values = &update.frame_data.property_values;
        assert_eq!(values[0], 1.0);
        assert!((values[1] - (-FRAC_PI_2 as f32)).abs() < 1e-6);
        assert!(values[2].abs() < 1e-6);
        assert!(values[3].abs() < 1e-6);
    }

    #[rstest]
    #[case::integer("-1", NO_PARENT)]
    #[case::float_no_parent("-1.0", NO_PARENT)]
    #[case::float_zero("0.0", 0)]
    #[case::exponent("2e0", 2)]
    #[case::float_max("2147483647.0", i32::MAX)]
    #[case::float_min("-2147483648.0", i32::MIN)]
    fn test_parent_as_whole_number(#[case] parent: &str, #[case] expected: i32) {
        let datagram = format!(r#"{{"s":{{"Bone":[{{"Name":"a","Parent":{},"Location":[0,0,0],"Rotation":[0,0,0,1],"Scale":[1,1,1]}}]}}}}"#, parent);
        let update = decode_single(&datagram).unwrap();
        assert_eq!(update.static_data.bone_parents, vec![expected]);
    }

    #[test]
    fn test_parameter_values_are_single_precision() {
        let update = decode_single(r#"{"s":{"Parameter":[{"Name":"a","Value":0.1},{"Name":"b","Value":-3}]}}"#).unwrap();
        assert_eq!(update.frame_data.property_values[..2], [0.1f32, -3.0f32]);
    }

    #[rstest]
    #[case::missing_bone_name(r#"{"Bone":[{"Parent":-1,"Location":[0,0,0],"Rotation":[0,0,0,1],"Scale":[1,1,1]}]}"#,
        SubjectDecodeError::InvalidField { section: BONE, index: 0, field: NAME })]
    #[case::numeric_bone_name(r#"{"Bone":[{"Name":7,"Parent":-1,"Location":[0,0,0],"Rotation":[0,0,0,1],"Scale":[1,1,1]}]}"#,
        SubjectDecodeError::InvalidField { section: BONE, index: 0, field: NAME })]
    #[case::missing_parent(r#"{"Bone":[{"Name":"a","Location":[0,0,0],"Rotation":[0,0,0,1],"Scale":[1,1,1]}]}"#,
        SubjectDecodeError::InvalidField { section: BONE, index: 0, field: PARENT })]
    #[case::fractional_parent(r#"{"Bone":[{"Name":"a","Parent":0.5,"Location":[0,0,0],"Rotation":[0,0,0,1],"Scale":[1,1,1]}]}"#,
        SubjectDecodeError::InvalidField { section: BONE, index: 0, field: PARENT })]
    #[case::negative_fractional_parent(r#"{"Bone":[{"Name":"a","Parent":-0.5,"Location":[0,0,0],"Rotation":[0,0,0,1],"Scale":[1,1,1]}]}"#,
        SubjectDecodeError::InvalidField { section: BONE, index: 0, field: PARENT })]
    #[case::float_parent_out_of_range(r#"{"Bone":[{"Name":"a","Parent":3e10,"Location":[0,0,0],"Rotation":[0,0,0,1],"Scale":[1,1,1]}]}"#,
        SubjectDecodeError::InvalidField { section: BONE, index: 0, field: PARENT })]
    #[case::parent_out_of_range(r#"{"Bone":[{"Name":"a","Parent":4294967296,"Location":[0,0,0],"Rotation":[0,0,0,1],"Scale":[1,1,1]}]}"#,
        SubjectDecodeError::InvalidField { section: BONE, index: 0, field: PARENT })]
    #[case::short_location(r#"{"Bone":[{"Name":"a","Parent":-1,"Location":[0,0],"Rotation":[0,0,0,1],"Scale":[1,1,1]}]}"#,
        SubjectDecodeError::InvalidVector { section: BONE, index: 0, field: LOCATION, expected: 3 })]
    #[case::long_rotation(r#"{"Bone":[{"Name":"a","Parent":-1,"Location":[0,0,0],"Rotation":[0,0,0,1,0],"Scale":[1,1,1]}]}"#,
        SubjectDecodeError::InvalidVector { section: BONE, index: 0, field: ROTATION, expected: 4 })]
    #[case::missing_scale(r#"{"Bone":[{"Name":"a","Parent":-1,"Location":[0,0,0],"Rotation":[0,0,0,1]}]}"#,
        SubjectDecodeError::InvalidVector { section: BONE, index: 0, field: SCALE, expected: 3 })]
    #[case::non_numeric_scale(r#"{"Bone":[{"Name":"a","Parent":-1,"Location":[0,0,0],"Rotation":[0,0,0,1],"Scale":[1,"1",1]}]}"#,
        SubjectDecodeError::InvalidVector { section: BONE, index: 0, field: SCALE, expected: 3 })]
    #[case::bone_not_an_object(r#"{"Bone":[5]}"#,
        SubjectDecodeError::EntryNotAnObject { section: BONE, index: 0 })]
    #[case::names_are_checked_before_geometry(r#"{"Bone":[{"Name":"a","Parent":-1},{"Parent":0,"Location":[0,0,0],"Rotation":[0,0,0,1],"Scale":[1,1,1]}]}"#,
        SubjectDecodeError::InvalidField { section: BONE, index: 1, field: NAME })]
    #[case::missing_parameter_name(r#"{"Parameter":[{"Name":"a","Value":1},{"Value":2}]}"#,
        SubjectDecodeError::InvalidField { section: PARAMETER, index: 1, field: NAME })]
    #[case::missing_parameter_value(r#"{"Parameter":[{"Name":"a","Value":1},{"Name":"b"}]}"#,
        SubjectDecodeError::InvalidField { section: PARAMETER, index: 1, field: VALUE })]
    #[case::string_parameter_value(r#"{"Parameter":[{"Name":"a","Value":"1"}]}"#,
        SubjectDecodeError::InvalidField { section: PARAMETER, index: 0, field: VALUE })]
    #[case::subject_not_an_object(r#"[1,2,3]"#,
        SubjectDecodeError::NotAnObject)]
    fn test_malformed_subject(#[case] subject: &str, #[case] expected: SubjectDecodeError) {
        let subject: Value = serde_json::from_str(subject).unwrap();
        assert_eq!(decode_subject("s", &subject), Err(expected));
    }

    #[test]
    fn test_malformed_subject_does_not_affect_others() {
        let datagram = json!({
            "A": {"Bone": [bone("root", -1, [0.0, 0.0, 0.0, 1.0])]},
            "B": {"Bone": [{"Parent": -1, "Location": [0, 0, 0], "Rotation": [0, 0, 0, 1], "Scale": [1, 1, 1]}]},
            "C": {"Parameter": [{"Name": "x", "Value": 2}]},
        }).to_string();

        let decoded = decode_datagram(datagram.as_bytes()).unwrap();
        assert_eq!(decoded.len(), 3);

        assert_eq!(decoded[0].0, "A");
        assert_eq!(decoded[0].1.as_ref().unwrap().static_data.bone_names, vec!["root"]);
        assert_eq!(decoded[1].0, "B");
        assert!(decoded[1].1.is_err());
        assert_eq!(decoded[2].0, "C");
        assert_eq!(decoded[2].1.as_ref().unwrap().frame_data.property_values[0], 2.0);
    }

    #[test]
    fn test_subjects_in_datagram_order() {
        let decoded = decode_datagram(br#"{"zeta":{},"alpha":{},"mu":{}}"#).unwrap();
        let names = decoded.iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["zeta", "alpha", "mu"]);
    }

    #[test]
    fn test_empty_subject() {
        let update = decode_single(r#"{"s":{}}"#).unwrap();
        assert_eq!(update.static_data, SkeletonStaticData::default());
        assert_eq!(update.frame_data, AnimationFrameData::default());
    }

    #[test]
    fn test_non_array_sections_count_as_absent() {
        let update = decode_single(r#"{"s":{"Bone":{"Name":"a"},"Parameter":"blink"}}"#).unwrap();
        assert_eq!(update.static_data, SkeletonStaticData::default());
        assert_eq!(update.frame_data, AnimationFrameData::default());
    }

    #[test]
    fn test_decoding_is_deterministic() {
        let datagram = json!({
            "Face": {
                "Bone": [bone("root", -1, [0.1, 0.2, 0.3, 0.927]), bone("head", 0, [0.5, -0.5, 0.5, 0.5])],
                "Parameter": [{"Name": "jawOpen", "Value": 0.25}, {"Name": "blink", "Value": 0.75}],
            }
        }).to_string();

        let first = decode_datagram(datagram.as_bytes()).unwrap();
        let second = decode_datagram(datagram.as_bytes()).unwrap();
        assert_eq!(first, second);

        let first_values = &first[0].1.as_ref().unwrap().frame_data.property_values;
        let second_values = &second[0].1.as_ref().unwrap().frame_data.property_values;
        assert!(first_values.iter().zip(second_values).all(|(a, b)| a.to_bits() == b.to_bits()));
    }

    #[rstest]
    #[case::invalid_utf8(b"{\"s\":\xff}")]
    #[case::invalid_json(b"{\"s\":")]
    #[case::empty(b"")]
    #[case::top_level_array(b"[{\"s\":{}}]")]
    #[case::top_level_number(b"42")]
    fn test_malformed_datagram(#[case] datagram: &[u8]) {
        assert!(decode_datagram(datagram).is_err());
    }

    #[test]
    fn test_datagram_error_kinds() {
        assert!(matches!(decode_datagram(b"\xff"), Err(DatagramError::InvalidUtf8(_))));
        assert!(matches!(decode_datagram(b"{"), Err(DatagramError::InvalidJson(_))));
        assert!(matches!(decode_datagram(b"null"), Err(DatagramError::NotAnObject)));
    }
}
