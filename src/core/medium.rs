/// Marker interface for participating media attached to cameras and rays.
/// Medium transport itself is the renderer's concern; the lens system only
/// tags the rays it produces with the camera's medium.
pub trait Medium {}
