pub mod frame_encoder;
pub mod ivf_format;
