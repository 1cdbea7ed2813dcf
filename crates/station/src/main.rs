//! stationhub - headless walk through the station hub.
//!
//! Loads the main station, walks the player into the game station, opens a
//! module overlay there, and returns through the exit portal. Every UI event
//! is logged; rendering hosts subscribe to the same events.

use anyhow::{bail, Context, Result};
use engine_core::Vec3;
use input::{ElementState, KeyCode, MouseButton};
use station::{GameConfig, StationApp, TransitionStage, UiEvent};

/// Give up on a leg after this many ticks (20 s at 60 Hz).
const LEG_TICKS: usize = 1200;
/// Waypoint reached within this horizontal distance.
const ARRIVAL: f32 = 0.12;

/// Walk toward each waypoint in turn, steering the view every tick, until
/// `arrived` holds or the route ends.
fn walk(app: &mut StationApp, waypoints: &[Vec3], mut arrived: impl FnMut(&StationApp) -> bool) -> Result<()> {
    app.handle_key(KeyCode::KeyW, ElementState::Pressed);
    let dt = app.config().fixed_dt();
    let mut route = waypoints.iter().copied().peekable();
    for _ in 0..LEG_TICKS {
        if arrived(app) {
            app.handle_key(KeyCode::KeyW, ElementState::Released);
            return Ok(());
        }
        if app.state.physics_frozen() {
            app.tick(dt);
            continue;
        }
        let Some(&target) = route.peek() else { break };
        let eye = app.state.player.position;
        let flat = Vec3::new(target.x - eye.x, 0.0, target.z - eye.z);
        if flat.length() < ARRIVAL && route.len() > 1 {
            route.next();
            continue;
        }
        app.state.look_at(Vec3::new(target.x, eye.y, target.z));
        app.tick(dt);
    }
    app.handle_key(KeyCode::KeyW, ElementState::Released);
    if arrived(app) {
        return Ok(());
    }
    bail!(
        "walk did not finish (player at {:?}, scene {:?})",
        app.state.player.position,
        app.state.current_scene
    )
}

fn portal_position(app: &StationApp, name: &str) -> Result<(Vec3, Vec3)> {
    let (_, portal) = app
        .state
        .find_portal(name)
        .with_context(|| format!("portal '{}' is not registered", name))?;
    Ok((portal.position, portal.facing))
}

/// Route along a module's catwalk: out along the radial line, then into the portal.
fn route_to(app: &StationApp, name: &str) -> Result<Vec<Vec3>> {
    let (position, facing) = portal_position(app, name)?;
    let outward = -facing;
    Ok(vec![outward * 3.0, position + facing * 1.0, position])
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = GameConfig::load();
    let mut app = StationApp::with_default_stations(config);
    app.state.subscribe(|event: &UiEvent| log::info!("ui: {:?}", event));
    app.start("main").context("loading the main station")?;

    if !app.run_until(120, |a| !a.is_snapping()) {
        bail!("player never settled on the hub deck");
    }
    log::info!("Spawned at {:?}", app.state.player.position);

    // Main station -> game station through the "Juego" portal.
    let route = route_to(&app, "Juego")?;
    walk(&mut app, &route, |a| a.state.current_scene.as_deref() == Some("game"))?;
    app.run_until(240, |a| a.transition_stage() == TransitionStage::Idle)
        .then_some(())
        .context("transition into the game station did not finish")?;

    // Open the "Jugabilidad" module, then close it from the overlay.
    let route = route_to(&app, "Jugabilidad")?;
    walk(&mut app, &route, |a| a.state.ui.active_section.is_some())?;
    app.run_until(120, |a| a.transition_stage() == TransitionStage::Idle);
    log::info!("Module open: {:?}", app.state.ui.active_section);
    app.handle_key(KeyCode::Escape, ElementState::Pressed);
    app.handle_key(KeyCode::Escape, ElementState::Released);
    // Click back into the view to grab the pointer again.
    app.handle_mouse_button(MouseButton::Left, ElementState::Pressed);
    app.handle_mouse_button(MouseButton::Left, ElementState::Released);

    // Back along the catwalk, around the mast, and up to the exit. Use the
    // Enter prompt instead of walking in.
    let (_, module_facing) = portal_position(&app, "Jugabilidad")?;
    let (exit_pos, exit_facing) = portal_position(&app, "Salir")?;
    let route = vec![
        -module_facing * 5.0,
        Vec3::new(0.0, 0.0, 1.5),
        -exit_facing * 3.0,
        exit_pos + exit_facing * 3.0,
    ];
    walk(&mut app, &route, |a| {
        let eye = a.state.player.position;
        Vec3::new(eye.x - exit_pos.x, 0.0, eye.z - exit_pos.z).length() < 3.2
    })?;
    app.tick(app.config().fixed_dt());
    if app.state.ui.hovered_portal.is_none() {
        bail!("exit portal prompt did not show");
    }
    app.handle_key(KeyCode::Enter, ElementState::Pressed);
    app.handle_key(KeyCode::Enter, ElementState::Released);
    app.run_until(240, |a| a.state.current_scene.as_deref() == Some("main") && a.transition_stage() == TransitionStage::Idle)
        .then_some(())
        .context("exit portal did not return to the main station")?;

    log::info!(
        "Back in '{}' at {:?} after {} transitions, {:.1}s simulated",
        app.state.current_scene.as_deref().unwrap_or("?"),
        app.state.player.position,
        app.transitions_completed(),
        app.elapsed()
    );
    Ok(())
}
