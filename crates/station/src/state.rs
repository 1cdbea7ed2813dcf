//! Shared state: the single mutable world every subsystem reads and writes.
//!
//! Player kinematics, view orientation, input, UI flags, transition flags, the
//! active scene and the per-scene registrations (ground colliders, portals,
//! obstacles, animation mixers) all live here. Registrations are entities in a
//! [`hecs::World`] tagged with their owning scene so a scene can be cleared in
//! one call.

use engine_core::{horizontal_distance, AnimationMixer, CameraOrientation, Entity, Name, SceneTag, Transform, Vec3};
use hecs::World;
use input::InputState;
use physics::{ColliderHandle, GroundShape, PhysicsWorld};

use crate::assets::ModelLibrary;
use crate::config::GameConfig;
use crate::events::{EventBus, UiEvent, UiListener};
use crate::portal::{PortalEntity, PortalSpec};

// ── Player ─────────────────────────────────────────────────────────────────

/// First-person player kinematics. `position` is the eye point.
#[derive(Debug, Clone)]
pub struct Player {
    pub position: Vec3,
    pub vel_y: f32,
    pub on_ground: bool,
    pub radius: f32,
    pub eye_height: f32,
    pub gravity: f32,
    pub jump_speed: f32,
    pub base_speed: f32,
    pub sprint_multiplier: f32,
    pub terminal_speed: f32,
    pub fall_threshold: f32,
}

impl Player {
    pub fn from_config(cfg: &crate::config::PlayerConfig, position: Vec3) -> Self {
        Self {
            position,
            vel_y: 0.0,
            on_ground: false,
            radius: cfg.radius,
            eye_height: cfg.eye_height,
            gravity: cfg.gravity,
            jump_speed: cfg.jump_speed,
            base_speed: cfg.base_speed,
            sprint_multiplier: cfg.sprint_multiplier,
            terminal_speed: cfg.terminal_speed,
            fall_threshold: cfg.fall_threshold,
        }
    }

    pub fn feet_y(&self) -> f32 {
        self.position.y - self.eye_height
    }

    /// Teleport with zeroed vertical velocity.
    pub fn place(&mut self, position: Vec3, on_ground: bool) {
        self.position = position;
        self.vel_y = 0.0;
        self.on_ground = on_ground;
    }
}

// ── UI & transition flags ──────────────────────────────────────────────────

/// Movement mode of the current zone. Space zones allow buffered jumps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ZoneMode {
    #[default]
    Space,
    Surface,
}

#[derive(Debug, Clone, Default)]
pub struct UiState {
    pub pointer_locked: bool,
    /// Module whose content overlay is open, if any.
    pub active_section: Option<String>,
    pub hovered_portal: Option<Entity>,
    pub zone_mode: ZoneMode,
}

#[derive(Debug, Clone, Default)]
pub struct TransitionState {
    /// Set from the moment a portal is accepted until the cooldown ends.
    pub is_transitioning: bool,
    /// Absolute time (seconds) at which the post-transition cooldown ends.
    pub cooldown_until: Option<f64>,
}

impl TransitionState {
    pub fn cooling_down(&self, now: f64) -> bool {
        self.cooldown_until.is_some_and(|until| now < until)
    }
}

/// Where an exit portal sends the player back to.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnPoint {
    pub scene: String,
    pub portal: PortalEntity,
}

// ── Registrations ──────────────────────────────────────────────────────────

/// Collider registered for an entity.
#[derive(Debug, Clone, Copy)]
pub struct ColliderRef(pub ColliderHandle);

/// Vertical cylinder the player is pushed out of horizontally (hub mast).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub center: Vec3,
    pub radius: f32,
}

/// Ring radius used for the forward-ray trigger disc.
pub const PORTAL_DISC_RADIUS: f32 = 1.9;

// ── Shared state ───────────────────────────────────────────────────────────

pub struct SharedState {
    pub player: Player,
    camera: CameraOrientation,
    /// Camera transform derived from player position and orientation.
    pub view: Transform,
    pub input: InputState,
    pub ui: UiState,
    pub transition: TransitionState,
    pub current_scene: Option<String>,
    pub respawn_point: Vec3,
    pub return_point: Option<ReturnPoint>,
    /// Simulation clock in seconds.
    pub now: f64,
    pub models: ModelLibrary,
    world: World,
    physics: PhysicsWorld,
    events: EventBus,
}

impl SharedState {
    pub fn new(config: &GameConfig) -> Self {
        let spawn = config.spawn.safe_spawn();
        let camera = CameraOrientation::new(config.camera.sensitivity, config.camera.max_pitch);
        Self {
            player: Player::from_config(&config.player, spawn),
            camera,
            view: Transform::from_position_rotation(spawn, camera.rotation()),
            input: InputState::new(),
            ui: UiState::default(),
            transition: TransitionState::default(),
            current_scene: None,
            respawn_point: spawn,
            return_point: None,
            now: 0.0,
            models: ModelLibrary::offline(),
            world: World::new(),
            physics: PhysicsWorld::new(),
            events: EventBus::new(),
        }
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    /// Player physics does not run while a transition or its cooldown is active.
    pub fn physics_frozen(&self) -> bool {
        self.transition.is_transitioning || self.transition.cooling_down(self.now)
    }

    /// Portal detection additionally pauses while a content overlay is open.
    pub fn detection_suppressed(&self) -> bool {
        self.physics_frozen() || self.ui.active_section.is_some()
    }

    // ── Events ──

    pub fn subscribe(&mut self, listener: impl UiListener + 'static) {
        self.events.subscribe(listener);
    }

    pub fn emit(&mut self, event: UiEvent) {
        self.events.emit(event);
    }

    // ── Input & view ──

    pub fn queue_jump(&mut self) {
        self.input.queue_jump();
    }

    pub fn consume_jump(&mut self) -> bool {
        self.input.consume_jump()
    }

    pub fn camera(&self) -> &CameraOrientation {
        &self.camera
    }

    /// Set yaw/pitch directly; pitch is clamped.
    pub fn update_camera_rotation(&mut self, yaw: f32, pitch: f32) {
        self.camera.set_rotation(yaw, pitch);
        self.sync_view();
    }

    /// Apply a pointer delta (pixels). Ignored unless the pointer is locked
    /// or the primary button is held (drag-to-look).
    pub fn apply_pointer_delta(&mut self, dx: f32, dy: f32) {
        let looking = self.ui.pointer_locked || self.input.is_pointer_held();
        if !looking || (dx == 0.0 && dy == 0.0) {
            return;
        }
        self.camera.process_mouse(dx, dy);
        self.sync_view();
    }

    /// Turn the view toward `target` from the current eye point.
    pub fn look_at(&mut self, target: Vec3) {
        self.camera.look_at(self.player.position, target);
        self.sync_view();
    }

    pub fn set_player_position(&mut self, position: Vec3) {
        self.player.position = position;
        self.sync_view();
    }

    pub fn sync_view(&mut self) {
        self.view = Transform::from_position_rotation(self.player.position, self.camera.rotation());
    }

    pub fn set_pointer_lock(&mut self, locked: bool) {
        if self.ui.pointer_locked == locked {
            return;
        }
        self.ui.pointer_locked = locked;
        if !locked {
            self.emit(UiEvent::PointerLockReleased);
        }
    }

    // ── Overlays ──

    pub fn set_active_section(&mut self, section: Option<String>) {
        self.ui.active_section = section;
    }

    /// Open a module's content overlay. Releases the pointer so the overlay is usable.
    pub fn open_game_module(&mut self, name: &str) {
        log::info!("Opening module '{}'", name);
        self.set_active_section(Some(name.to_string()));
        self.set_pointer_lock(false);
        self.emit(UiEvent::OpenGameModule {
            module_name: name.to_string(),
        });
    }

    /// Close the active overlay, if any. The hovered portal is cleared too.
    pub fn close_game_module(&mut self) -> bool {
        let Some(name) = self.ui.active_section.take() else {
            return false;
        };
        log::info!("Closing module '{}'", name);
        self.set_hovered_portal(None);
        self.emit(UiEvent::CloseGameModule);
        true
    }

    pub fn set_hovered_portal(&mut self, portal: Option<Entity>) {
        if self.ui.hovered_portal == portal {
            return;
        }
        self.ui.hovered_portal = portal;
        let event = match portal.and_then(|p| self.portal(p)) {
            Some(p) => UiEvent::PortalPrompt { name: p.name },
            None => UiEvent::PromptHidden,
        };
        self.emit(event);
    }

    // ── Scene registrations ──

    /// Register a walkable surface for `scene`.
    pub fn add_space_ground(&mut self, scene: &str, shape: GroundShape) -> Entity {
        let entity = self.world.reserve_entity();
        let handle = self.physics.add_ground(shape, entity);
        self.world.spawn_at(entity, (SceneTag::new(scene), ColliderRef(handle)));
        entity
    }

    /// Register one portal. A portal with the same name in the same scene is replaced.
    pub fn add_portal(&mut self, scene: &str, spec: &PortalSpec) -> Entity {
        let existing: Vec<Entity> = self
            .world
            .query::<(&SceneTag, &PortalEntity)>()
            .iter()
            .filter(|(_, (tag, portal))| tag.is(scene) && portal.name == spec.name)
            .map(|(e, _)| e)
            .collect();
        for entity in existing {
            self.despawn_registration(entity);
        }

        let portal = PortalEntity::from_spec(spec);
        let entity = self.world.reserve_entity();
        let handle = self
            .physics
            .add_portal_disc(spec.position, spec.facing, PORTAL_DISC_RADIUS, entity);
        self.world
            .spawn_at(entity, (SceneTag::new(scene), Name(spec.name.clone()), portal, ColliderRef(handle)));
        entity
    }

    /// Replace every portal of `scene` with `specs`. Calling it again with the
    /// same list leaves the same set registered.
    pub fn register_portals(&mut self, scene: &str, specs: &[PortalSpec]) -> Vec<Entity> {
        let stale: Vec<Entity> = self
            .world
            .query::<(&SceneTag, &PortalEntity)>()
            .iter()
            .filter(|(_, (tag, _))| tag.is(scene))
            .map(|(e, _)| e)
            .collect();
        for entity in stale {
            self.despawn_registration(entity);
        }
        specs.iter().map(|spec| self.add_portal(scene, spec)).collect()
    }

    pub fn add_obstacle(&mut self, scene: &str, obstacle: Obstacle) -> Entity {
        self.world.spawn((SceneTag::new(scene), obstacle))
    }

    pub fn add_mixer(&mut self, scene: &str, mixer: AnimationMixer) -> Entity {
        self.world.spawn((SceneTag::new(scene), mixer))
    }

    /// Remove everything `scene` registered.
    pub fn clear_scene(&mut self, scene: &str) {
        let owned: Vec<Entity> = self
            .world
            .query::<&SceneTag>()
            .iter()
            .filter(|(_, tag)| tag.is(scene))
            .map(|(e, _)| e)
            .collect();
        if owned.is_empty() {
            return;
        }
        let handles: Vec<ColliderHandle> = owned
            .iter()
            .filter_map(|&e| self.world.get::<&ColliderRef>(e).ok().map(|c| c.0))
            .collect();
        self.physics.remove_colliders(handles);
        if self.ui.hovered_portal.is_some_and(|p| owned.contains(&p)) {
            self.set_hovered_portal(None);
        }
        for entity in &owned {
            let _ = self.world.despawn(*entity);
        }
        log::debug!("Cleared {} registrations of scene '{}'", owned.len(), scene);
    }

    fn despawn_registration(&mut self, entity: Entity) {
        if let Ok(collider) = self.world.get::<&ColliderRef>(entity).map(|c| c.0) {
            self.physics.remove_collider(collider);
        }
        if self.ui.hovered_portal == Some(entity) {
            self.set_hovered_portal(None);
        }
        let _ = self.world.despawn(entity);
    }

    // ── Queries ──

    pub fn portal(&self, entity: Entity) -> Option<PortalEntity> {
        self.world.get::<&PortalEntity>(entity).ok().map(|p| (*p).clone())
    }

    pub fn portals(&self) -> Vec<(Entity, PortalEntity)> {
        self.world
            .query::<&PortalEntity>()
            .iter()
            .map(|(e, p)| (e, p.clone()))
            .collect()
    }

    pub fn find_portal(&self, name: &str) -> Option<(Entity, PortalEntity)> {
        self.world
            .query::<&PortalEntity>()
            .iter()
            .find(|(_, p)| p.name == name)
            .map(|(e, p)| (e, p.clone()))
    }

    /// Nearest portal to `point` within `radius` (3D distance).
    pub fn nearest_portal(&self, point: Vec3, radius: f32) -> Option<(Entity, PortalEntity)> {
        self.portals()
            .into_iter()
            .map(|(e, p)| (p.position.distance(point), e, p))
            .filter(|(d, _, _)| *d <= radius)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, e, p)| (e, p))
    }

    /// Nearest portal by horizontal distance within `radius`.
    pub fn nearest_portal_horizontal(&self, point: Vec3, radius: f32) -> Option<(Entity, PortalEntity)> {
        self.portals()
            .into_iter()
            .map(|(e, p)| (horizontal_distance(p.position, point), e, p))
            .filter(|(d, _, _)| *d <= radius)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, e, p)| (e, p))
    }

    pub fn obstacles(&self) -> Vec<Obstacle> {
        self.world.query::<&Obstacle>().iter().map(|(_, o)| *o).collect()
    }

    pub fn registration_count(&self, scene: &str) -> usize {
        self.world
            .query::<&SceneTag>()
            .iter()
            .filter(|(_, tag)| tag.is(scene))
            .count()
    }

    pub fn portal_count(&self, scene: &str) -> usize {
        self.world
            .query::<(&SceneTag, &PortalEntity)>()
            .iter()
            .filter(|(_, (tag, _))| tag.is(scene))
            .count()
    }

    pub fn ground_collider_count(&self) -> usize {
        self.physics.collider_count()
    }

    /// Advance every registered animation mixer.
    pub fn update_mixers(&mut self, dt: f32) {
        for (_, mixer) in self.world.query_mut::<&mut AnimationMixer>() {
            mixer.update(dt);
        }
    }

    pub fn mixer_count(&self) -> usize {
        self.world.query::<&AnimationMixer>().iter().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portal::PortalTarget;
    use input::{ElementState, MouseButton};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn spec(name: &str, x: f32) -> PortalSpec {
        PortalSpec::new(name, Vec3::new(x, 1.6, 0.0), Vec3::NEG_X, PortalTarget::Section(name.into()))
    }

    #[test]
    fn register_portals_is_idempotent() {
        let mut state = SharedState::new(&GameConfig::default());
        let specs = [spec("Inicio", 10.0), spec("Proyecto", -10.0)];
        state.register_portals("main", &specs);
        let colliders = state.ground_collider_count();
        state.register_portals("main", &specs);
        assert_eq!(state.portal_count("main"), 2);
        assert_eq!(state.ground_collider_count(), colliders);
    }

    #[test]
    fn add_portal_replaces_same_name() {
        let mut state = SharedState::new(&GameConfig::default());
        state.add_portal("main", &spec("Inicio", 10.0));
        state.add_portal("main", &spec("Inicio", 12.0));
        state.add_portal("game", &spec("Inicio", 12.0));
        assert_eq!(state.portal_count("main"), 1);
        assert_eq!(state.portal_count("game"), 1);
        let (_, p) = state.find_portal("Inicio").expect("registered");
        assert_eq!(p.position.x, 12.0);
    }

    #[test]
    fn clear_scene_removes_only_that_scene() {
        let mut state = SharedState::new(&GameConfig::default());
        state.add_space_ground("main", GroundShape::slab(Vec3::ZERO, 0.0, Vec3::new(5.0, 0.05, 5.0)));
        state.add_portal("main", &spec("Inicio", 10.0));
        state.add_obstacle("main", Obstacle { center: Vec3::ZERO, radius: 0.3 });
        state.add_mixer("main", AnimationMixer::default());
        state.add_portal("game", &spec("Salir", 5.0));

        state.clear_scene("main");
        assert_eq!(state.registration_count("main"), 0);
        assert_eq!(state.registration_count("game"), 1);
        assert_eq!(state.ground_collider_count(), 1);
        assert!(state.obstacles().is_empty());
        assert_eq!(state.mixer_count(), 0);
    }

    #[test]
    fn clearing_hovered_portal_emits_prompt_hidden() {
        let mut state = SharedState::new(&GameConfig::default());
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        state.subscribe(move |e: &UiEvent| sink.borrow_mut().push(e.clone()));

        let portal = state.add_portal("main", &spec("Inicio", 10.0));
        state.set_hovered_portal(Some(portal));
        state.clear_scene("main");
        assert_eq!(state.ui.hovered_portal, None);
        assert_eq!(
            *events.borrow(),
            vec![UiEvent::PortalPrompt { name: "Inicio".into() }, UiEvent::PromptHidden]
        );
    }

    #[test]
    fn opening_a_module_releases_pointer_and_closing_clears_hover() {
        let mut state = SharedState::new(&GameConfig::default());
        state.set_pointer_lock(true);
        let portal = state.add_portal("main", &spec("Inicio", 10.0));
        state.set_hovered_portal(Some(portal));

        state.open_game_module("Inicio");
        assert!(!state.ui.pointer_locked);
        assert_eq!(state.ui.active_section.as_deref(), Some("Inicio"));
        assert!(state.detection_suppressed());

        assert!(state.close_game_module());
        assert_eq!(state.ui.active_section, None);
        assert_eq!(state.ui.hovered_portal, None);
        assert!(!state.close_game_module());
    }

    #[test]
    fn pointer_delta_ignored_while_unlocked() {
        let mut state = SharedState::new(&GameConfig::default());
        state.apply_pointer_delta(100.0, 0.0);
        assert_eq!(state.camera().yaw(), 0.0);
        state.set_pointer_lock(true);
        state.apply_pointer_delta(100.0, 0.0);
        assert!((state.camera().yaw() + 0.25).abs() < 1e-6);
    }

    #[test]
    fn registrations_spawn_with_their_collider() {
        let mut state = SharedState::new(&GameConfig::default());
        let ground = state.add_space_ground("main", GroundShape::slab(Vec3::ZERO, 0.0, Vec3::new(5.0, 0.05, 5.0)));
        let portal = state.add_portal("main", &spec("Inicio", 3.0));
        for entity in [ground, portal] {
            let handle = state.world.get::<&ColliderRef>(entity).map(|c| c.0).expect("collider ref");
            assert_eq!(state.physics().collider_owner(handle), Some(entity));
            assert!(state.world.get::<&SceneTag>(entity).is_ok());
        }
        assert_eq!(state.portal(portal).map(|p| p.name), Some("Inicio".to_string()));
    }

    #[test]
    fn drag_turns_view_without_pointer_lock() {
        let mut state = SharedState::new(&GameConfig::default());
        state.input.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        state.apply_pointer_delta(0.0, 40.0);
        assert!((state.camera().pitch() + 0.1).abs() < 1e-6);
        state.input.process_mouse_button(MouseButton::Left, ElementState::Released);
        state.apply_pointer_delta(0.0, 40.0);
        assert!((state.camera().pitch() + 0.1).abs() < 1e-6);
    }

    #[test]
    fn update_camera_rotation_clamps_pitch() {
        let mut state = SharedState::new(&GameConfig::default());
        state.update_camera_rotation(0.3, 10.0);
        assert!(state.camera().pitch() <= state.camera().max_pitch());
        assert_eq!(state.view.position, state.player.position);
    }

    #[test]
    fn jump_queue_is_consumed_once() {
        let mut state = SharedState::new(&GameConfig::default());
        state.queue_jump();
        assert!(state.consume_jump());
        assert!(!state.consume_jump());
    }
}
