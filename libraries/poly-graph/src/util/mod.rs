pub(crate) mod aabb;
pub(crate) mod grid;
pub(crate) mod math;
