//! Headless movement sandbox
//!
//! Composition root for the engine: builds a small synthetic level, wires
//! geometry -> index -> resolver -> integrator -> scheduler, then drives
//! the loop with scripted input and logs what the body does. Useful for
//! eyeballing movement tuning without a renderer attached.

use std::cell::RefCell;
use std::rc::Rc;

use motion_engine::prelude::*;

/// Synthetic test level: a floor, a wall to slide along, and a ledge.
fn build_test_level() -> StaticGeometry {
    let mut triangles = Vec::new();

    let mut quad = |a: Vec3, b: Vec3, c: Vec3, d: Vec3| {
        triangles.push(Triangle::new(a, b, c));
        triangles.push(Triangle::new(a, c, d));
    };

    // Floor, 40x40 around the origin
    quad(
        Vec3::new(-20.0, 0.0, -20.0),
        Vec3::new(20.0, 0.0, -20.0),
        Vec3::new(20.0, 0.0, 20.0),
        Vec3::new(-20.0, 0.0, 20.0),
    );

    // Wall across +Z at z = 8
    quad(
        Vec3::new(-20.0, 0.0, 8.0),
        Vec3::new(-20.0, 3.0, 8.0),
        Vec3::new(20.0, 3.0, 8.0),
        Vec3::new(20.0, 0.0, 8.0),
    );

    // A knee-high ledge top at x in [4, 8]
    quad(
        Vec3::new(4.0, 0.5, -2.0),
        Vec3::new(8.0, 0.5, -2.0),
        Vec3::new(8.0, 0.5, 2.0),
        Vec3::new(4.0, 0.5, 2.0),
    );

    StaticGeometry::from_triangles(triangles)
}

/// Scripted input: walk at the wall, sprint along it, jump, then rest.
fn scripted_intent(t: f32) -> InputIntent {
    if t < 2.5 {
        // Walk forward into the wall
        InputIntent::new(Vec2::new(0.0, 1.0), IntentButtons::empty())
    } else if t < 5.0 {
        // Sprint diagonally; the wall forces a slide along X
        InputIntent::new(Vec2::new(1.0, 1.0), IntentButtons::SPRINT)
    } else if t < 5.1 {
        InputIntent::new(Vec2::new(0.0, 1.0), IntentButtons::JUMP)
    } else if t < 7.0 {
        InputIntent::new(Vec2::new(0.0, 1.0), IntentButtons::CROUCH)
    } else {
        InputIntent::idle()
    }
}

fn main() {
    env_logger::init();
    log::info!("starting movement sandbox");

    let config = SimConfig::default();

    let geometry = build_test_level();
    log::info!("test level: {} triangles", geometry.len());

    let index = Bvh::build(geometry, &config.spatial);
    let resolver = Rc::new(CollisionResolver::with_index(index, config.collision.clone()));

    let player = Rc::new(RefCell::new(KinematicIntegrator::new(
        config.movement.clone(),
        Vec3::zeros(),
    )));
    player.borrow_mut().spawn(Vec3::new(0.0, 0.25, -5.0), &resolver);

    let mut scheduler = SimulationScheduler::new(config.scheduler.clone());

    scheduler.observe(|old, new| log::info!("scheduler {old:?} -> {new:?}"));

    // Physics: scripted intent, fixed look direction down +Z
    let sim_time = Rc::new(RefCell::new(0.0f32));
    {
        let player = Rc::clone(&player);
        let resolver = Rc::clone(&resolver);
        let sim_time = Rc::clone(&sim_time);
        scheduler.register_fixed(move |dt, _signals| {
            let t = {
                let mut t = sim_time.borrow_mut();
                *t += dt;
                *t
            };
            let intent = scripted_intent(t);
            player
                .borrow_mut()
                .step(dt, &intent, Vec3::new(0.0, 0.0, 1.0), &resolver);
        });
    }

    // "Renderer": report the committed state twice a second
    {
        let player = Rc::clone(&player);
        let mut frames = 0u32;
        scheduler.register_render(move |alpha, _signals| {
            frames += 1;
            if frames % 30 == 0 {
                let p = player.borrow();
                let eye = p.eye_position();
                let vel = p.velocity();
                log::info!(
                    "eye ({:6.2} {:6.2} {:6.2}) vel ({:5.2} {:5.2} {:5.2}) grounded {:5} sprinting {:5} stamina {:5.1} alpha {alpha:.2}",
                    eye.x, eye.y, eye.z,
                    vel.x, vel.y, vel.z,
                    p.grounded(),
                    p.sprinting(),
                    p.stamina(),
                );
            }
        });
    }

    scheduler.start().expect("scheduler should start from stopped");

    // Headless host loop: eight seconds of synthetic 60 Hz frames, with one
    // simulated hitch to show the clamp at work
    for frame in 0..480 {
        if frame == 240 {
            log::info!("injecting a 5s frame hitch");
            scheduler.advance(5.0);
        } else {
            scheduler.advance(1.0 / 60.0);
        }
    }

    scheduler.stop().expect("scheduler should stop from running");

    let p = player.borrow();
    let pos = p.position();
    log::info!(
        "final position ({:.2} {:.2} {:.2}), stamina {:.1}",
        pos.x,
        pos.y,
        pos.z,
        p.stamina()
    );
}
