//! Common ECS components used across the engine.

/// Owning scene of an entity. Everything a scene registers carries this tag so
/// the whole set can be cleared when the scene is unloaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SceneTag(pub String);

impl SceneTag {
    pub fn new(scene: impl Into<String>) -> Self {
        Self(scene.into())
    }

    pub fn is(&self, scene: &str) -> bool {
        self.0 == scene
    }
}

/// Display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name(pub String);

/// Per-scene animation clock (one per animated model).
#[derive(Debug, Clone, Copy)]
pub struct AnimationMixer {
    pub time: f32,
    pub speed: f32,
}

impl Default for AnimationMixer {
    fn default() -> Self {
        Self { time: 0.0, speed: 1.0 }
    }
}

impl AnimationMixer {
    pub fn update(&mut self, dt: f32) {
        self.time += dt * self.speed;
    }
}
