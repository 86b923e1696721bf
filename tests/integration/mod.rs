// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod collection_flow_test;
pub mod extraction_flow_test;
pub mod gateway_test;
pub mod helpers;
