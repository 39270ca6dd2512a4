use glam::Vec3;

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Share of the 0-100 progress value reserved for the download. The rest
    /// covers resource loading.
    pub download_phase_ceiling: u8,
    /// Vertical field of view in degrees.
    pub field_of_view: f32,
    pub initial_camera_position: Vec3,
    pub grid_divisions: u32,
    /// Accept glTF 2 files that require KHR_draco_mesh_compression.
    pub compressed_geometry: bool,
    /// Read size for local files.
    pub chunk_size: usize,
}

impl ViewerConfig {
    pub fn with_download_phase_ceiling(mut self, ceiling: u8) -> Self {
        self.download_phase_ceiling = ceiling.min(100);
        self
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            download_phase_ceiling: 75,
            field_of_view: 35.0,
            initial_camera_position: Vec3::new(0.0, 0.0, 1.0),
            grid_divisions: 10,
            compressed_geometry: true,
            chunk_size: 64 * 1024,
        }
    }
}
