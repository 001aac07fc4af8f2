pub mod decode_task_tokio;
