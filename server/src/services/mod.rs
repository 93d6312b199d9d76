pub mod assets;
pub mod layer_cache;
