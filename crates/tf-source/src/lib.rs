/// Sources visuelles pour txtframe : images fixes et vidéo.
///
/// Côté collaborateur : tout ce qui fait de l'I/O ou du décodage vit ici,
/// jamais dans le cœur de conversion.

pub mod image;

#[cfg(feature = "video")]
pub mod video;
