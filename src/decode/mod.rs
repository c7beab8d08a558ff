pub mod decode_error;
pub mod frame_decoder;
pub mod head_orientation;
