// This file is an example of how to use the `plan_vision` library.
// The main library entry point is `src/lib.rs`.

fn main() {
    println!("Plan Vision Engine - Example Runner");
    // In a real application, you would implement `Detector` for your
    // inference client, rasterize the uploaded document into page images,
    // and feed them through the pipeline here.
    //
    // Example:
    // let config = plan_vision::pipeline::PipelineConfig::default();
    // let pipeline = PlanPipeline::new(MyVisionClient::new(api_key), config);
    // let detections = pipeline.locate_equipment(&pages, &descriptors, &hints).await?;
    // println!("Located: {:?}", detections);
}
