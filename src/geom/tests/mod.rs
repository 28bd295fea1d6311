mod test_mesh_sanity;
mod test_spline_basic;
mod test_triangulation_basic;
