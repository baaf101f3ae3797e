mod test_poly_basic;
mod test_sweep_basic;
