//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements                    | Connects to              |
//! |-------------|-------------------------------|--------------------------|
//! | `wifi`      | ConnectivityPort, RadioPort   | ESP-IDF WiFi STA, SNTP   |
//! | `time`      | ClockPort                     | gettimeofday / esp_timer |
//! | `system`    | SystemPort                    | heap stats, esp_restart  |
//! | `nvs`       | StoragePort                   | NVS / in-memory store    |
//! | `publish`   | PublishPort                   | Serial log (JSON vitals) |
//! | `log_sink`  | EventSink                     | Serial log output        |
//! | `platform`  | all driven ports + save flag  | the adapters above       |
//! | `device_id` | (helpers)                     | eFuse MAC                |

pub mod device_id;
pub mod log_sink;
pub mod nvs;
pub mod platform;
pub mod publish;
pub mod system;
pub mod time;
pub mod wifi;
