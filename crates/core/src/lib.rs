pub mod shared {
    pub mod config;
    pub mod constants;
    pub mod frame;
    pub mod plate_region;
}

pub mod detection {
    pub mod domain {
        pub mod detection_error;
        pub mod detection_result;
        pub mod plate_detector;
    }
    pub mod infrastructure;
}

pub mod blurring {
    pub mod domain {
        pub mod blur_compositor;
        pub mod occlusion_mask;
    }
    pub mod infrastructure;
}

pub mod video {
    pub mod domain {
        pub mod frame_reader;
        pub mod frame_writer;
        pub mod image_reader;
        pub mod image_writer;
        pub mod orientation;
    }
    pub mod infrastructure {
        pub mod exif_orientation;
        pub mod image_file_reader;
        pub mod image_file_writer;
        pub mod raw_frame_reader;
        pub mod raw_frame_writer;
    }
}

pub mod pipeline {
    pub mod blur_folder_use_case;
    pub mod blur_image_use_case;
    pub mod blur_stream_use_case;
    pub mod pipeline_logger;
    pub mod plate_anonymizer;
}
