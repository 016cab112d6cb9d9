pub mod shared {
    pub mod bbox;
    pub mod constants;
    pub mod frame;
    pub mod model_resolver;
    pub mod video_metadata;
}

pub mod detection {
    pub mod domain {
        pub mod detection;
        pub mod object_detector;
    }
    pub mod infrastructure;
}

pub mod sitting {
    pub mod domain {
        pub mod contact_state;
        pub mod frame_classifier;
        pub mod sitting_config;
        pub mod sitting_engine;
        pub mod verdict;
    }
    pub mod error;
}

pub mod pipeline {
    pub mod evaluate_image_use_case;
    pub mod evaluate_video_use_case;
    pub mod pipeline_logger;
}

pub mod video {
    pub mod domain {
        pub mod video_reader;
    }
    pub mod infrastructure {
        pub mod ffmpeg_reader;
        pub mod image_file_reader;
    }
}

pub mod history {
    pub mod domain {
        pub mod history_ledger;
        pub mod report_generator;
    }
    pub mod error;
    pub mod infrastructure;
}
