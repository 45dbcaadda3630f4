pub mod video_batch_adapter;
