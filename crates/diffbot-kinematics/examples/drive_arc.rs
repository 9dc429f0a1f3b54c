use diffbot_kinematics::*;

fn main() {
    let wheel_radius = 0.055;
    let axle_length = 0.245;
    let kinematics_result = DifferentialDrive::new(wheel_radius, axle_length);

    let mut current_pose = Pose::new(0.0, 0.0, 0.0);
    let wheel_speeds = WheelSpeeds::new(2.5, 3.5); // right wheel faster: gentle left arc
    let dt = 0.015; // Control period in seconds
    let num_steps = 400;

    match kinematics_result {
        Ok(kinematics) => {
            let chassis_speeds = kinematics.forward_kinematics(wheel_speeds);
            println!("Initializing simulation...");
            println!("  {}", kinematics);
            println!("  Wheel Speeds:   {}", wheel_speeds);
            println!("  Chassis Speeds: {}", chassis_speeds);
            println!("  Time Step:      {} s", dt);
            println!("  Num Steps:      {}", num_steps);
            println!("\nSimulating...");

            for i in 0..num_steps {
                current_pose = kinematics.update_pose(current_pose, chassis_speeds, dt);
                if (i + 1) % 50 == 0 {
                    println!("Step {:>3}: Pose: {}", i + 1, current_pose);
                }
            }

            // The arc integration composes exactly, so one big step lands on the same pose
            let single_step = kinematics.update_pose(Pose::default(), chassis_speeds, dt * num_steps as f64);
            println!("\nSimulation complete.");
            println!("Final Pose:       {}", current_pose);
            println!("Single-step Pose: {}", single_step);
            println!("Closure error:    {:.2e} m", current_pose.distance_to(&single_step));
        }
        Err(e) => {
            eprintln!("Failed to initialize kinematics: {}", e);
        }
    }
}
