mod discrete_solver_tests;
mod fixed_step_tests;
