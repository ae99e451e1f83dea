// Simulation timing
pub const FIXED_TIMESTEP: f32 = 1.0 / 60.0; // 60 Hz fixed update
pub const MS_TO_KMH: f32 = 3.6;

// World
pub const GRAVITY: f32 = -9.82;
pub const WORLD_BOUND: f32 = 500.0;
pub const GROUND_SIZE: f32 = 1000.0;

// Traffic
pub const TRAFFIC_COUNT: usize = 20;
pub const TRAFFIC_SPAWN_EXTENT: f32 = 200.0;
pub const TRAFFIC_CONTACT_DISTANCE: f32 = 5.0;
pub const TRAFFIC_RESPAWN_DELAY_MS: u64 = 3000;
pub const TRAFFIC_SIZE: [f32; 3] = [2.0, 1.0, 4.0];

// Particles
pub const PARTICLE_CAPACITY: usize = 512;
pub const EXPLOSION_DEBRIS: usize = 20;

// Presentation timings
pub const NOTIFICATION_MS: u64 = 3000;
pub const CAMERA_SHAKE_INTENSITY: f32 = 0.5;
pub const CAMERA_SHAKE_MS: u64 = 300;

// Health
pub const MAX_HEALTH: f32 = 100.0;
