//! Shared fixture tables for unit tests

use serde_json::json;

use crate::compat::store::CompatibilityTables;

pub(crate) fn fixture_tables() -> CompatibilityTables {
    let tf = json!([
        {
            "TF": "2.4.0",
            "TFCPUPackage": "tensorflow==2.4.0",
            "TFGPUPackage": "tensorflow-gpu==2.4.0",
            "CUDA": "11.0",
            "CuDNN": "8.0",
            "Pythons": ["3.6", "3.7", "3.8"]
        },
        {
            "TF": "2.10.0",
            "TFCPUPackage": "tensorflow==2.10.0",
            "TFGPUPackage": "tensorflow==2.10.0",
            "CUDA": "11.2",
            "CuDNN": "8.1",
            "Pythons": ["3.7", "3.8", "3.9", "3.10"]
        },
        {
            "TF": "2.12.0",
            "TFCPUPackage": "tensorflow==2.12.0",
            "TFGPUPackage": "tensorflow==2.12.0",
            "CUDA": "11.8",
            "CuDNN": "8.6",
            "Pythons": ["3.8", "3.9", "3.10", "3.11"]
        },
        {
            "TF": "2.9.0",
            "TFCPUPackage": "tensorflow==2.9.0",
            "TFGPUPackage": "tensorflow==2.9.0",
            "CUDA": "11.2",
            "CuDNN": "8.1",
            "Pythons": ["3.7", "3.8", "3.9", "3.10"]
        }
    ]);

    let torch = json!([
        {
            "Torch": "1.13.1+cu116",
            "Torchvision": "0.14.1+cu116",
            "Torchaudio": "0.13.1+cu116",
            "IndexURL": "https://download.pytorch.org/whl/cu116",
            "CUDA": "11.6",
            "Pythons": ["3.7", "3.8", "3.9", "3.10"]
        },
        {
            "Torch": "1.13.1+cu117",
            "Torchvision": "0.14.1+cu117",
            "Torchaudio": "0.13.1+cu117",
            "IndexURL": "https://download.pytorch.org/whl/cu117",
            "CUDA": "11.7",
            "Pythons": ["3.7", "3.8", "3.9", "3.10"]
        },
        {
            "Torch": "1.13.1+cpu",
            "Torchvision": "0.14.1+cpu",
            "Torchaudio": "0.13.1+cpu",
            "IndexURL": "https://download.pytorch.org/whl/cpu",
            "CUDA": null,
            "Pythons": ["3.7", "3.8", "3.9", "3.10"]
        },
        {
            "Torch": "2.0.1+cu117",
            "Torchvision": "0.15.2+cu117",
            "Torchaudio": "2.0.2+cu117",
            "IndexURL": "https://download.pytorch.org/whl/cu117",
            "CUDA": "11.7",
            "Pythons": ["3.8", "3.9", "3.10", "3.11"]
        },
        {
            "Torch": "2.0.1+cu118",
            "Torchvision": "0.15.2+cu118",
            "Torchaudio": "2.0.2+cu118",
            "IndexURL": "https://download.pytorch.org/whl/cu118",
            "CUDA": "11.8",
            "Pythons": ["3.8", "3.9", "3.10", "3.11"]
        },
        {
            "Torch": "2.0.1",
            "Torchvision": "0.15.2",
            "Torchaudio": "2.0.2",
            "IndexURL": "",
            "CUDA": null,
            "Pythons": ["3.8", "3.9", "3.10", "3.11"]
        }
    ]);

    let cuda_images = json!([
        "10.2-cudnn7-devel-ubuntu18.04",
        "10.2-cudnn8-devel-ubuntu18.04",
        "11.0-cudnn8-devel-ubuntu20.04",
        "11.2-cudnn8-devel-ubuntu20.04",
        "11.2-cudnn8-runtime-ubuntu20.04",
        "11.6-cudnn8-devel-ubuntu20.04",
        "11.7-cudnn8-devel-ubuntu22.04",
        "11.8-cudnn8-devel-ubuntu22.04",
        "11.8-cudnn8-runtime-ubuntu22.04"
    ]);

    CompatibilityTables::from_json(&tf.to_string(), &torch.to_string(), &cuda_images.to_string())
        .expect("fixture tables are valid")
}
